//! Android change notifier backed by the Java support class
//!
//! The NDK exposes no connectivity callbacks, so a small Java class registers
//! a `ConnectivityManager.NetworkCallback` and calls back into native code
//! with the raw handle it was started with.

use jni::objects::{GlobalRef, JObject, JValue};
use jni::sys::jobject;
use jni::{JNIEnv, JavaVM};
use once_cell::sync::Lazy;
use parking_lot::Mutex;

use super::ChangeNotifier;
use crate::bridge::RawCallbackHandle;
use crate::Error;

const CONTEXT_CTOR_SIG: &str = "(Landroid/content/Context;)V";

struct AndroidContext {
    vm: JavaVM,
    context: GlobalRef,
}

static ANDROID_CONTEXT: Lazy<Mutex<Option<AndroidContext>>> = Lazy::new(|| Mutex::new(None));

/// Set the Android `Context` used to construct the Java support class
///
/// Only needed when the NDK context (set up by `android-activity` and
/// friends) is not available, e.g. in a plain JNI library loaded by an app.
pub fn set_android_context(env: &mut JNIEnv, context: &JObject) -> Result<(), Error> {
    let vm = env.get_java_vm()?;
    let context = env.new_global_ref(context)?;
    *ANDROID_CONTEXT.lock() = Some(AndroidContext { vm, context });
    tracing::debug!("android context set");
    Ok(())
}

/// VM and context pointers, holding the context's global reference if it has one
struct ResolvedContext {
    vm: *mut jni::sys::JavaVM,
    context: jobject,
    _retain: Option<GlobalRef>,
}

impl ResolvedContext {
    fn from_raw(vm: *mut jni::sys::JavaVM, context: jobject) -> Option<Self> {
        if vm.is_null() || context.is_null() {
            return None;
        }
        Some(Self {
            vm,
            context,
            _retain: None,
        })
    }
}

fn explicit_context() -> Option<ResolvedContext> {
    ANDROID_CONTEXT.lock().as_ref().map(|ctx| ResolvedContext {
        vm: ctx.vm.get_java_vm_pointer(),
        context: ctx.context.as_obj().as_raw(),
        _retain: Some(ctx.context.clone()),
    })
}

/// `ndk_context` panics when nothing initialized it; that means no context
fn ndk_fallback_context() -> Option<ResolvedContext> {
    let ctx = std::panic::catch_unwind(ndk_context::android_context).ok()?;
    ResolvedContext::from_raw(ctx.vm().cast(), ctx.context() as jobject)
}

/// The explicit context wins; the NDK one is only consulted without it
fn resolve_context(
    explicit: Option<ResolvedContext>,
    fallback: impl FnOnce() -> Option<ResolvedContext>,
) -> Option<ResolvedContext> {
    explicit.or_else(fallback)
}

fn android_context() -> Option<ResolvedContext> {
    resolve_context(explicit_context(), ndk_fallback_context)
}

struct JavaSupport {
    vm: JavaVM,
    object: GlobalRef,
}

/// Drives `startInterfaceWatch(long)` / `stopInterfaceWatch()` on the Java side
pub struct JavaNotifier {
    support_class: String,
    active: Option<JavaSupport>,
}

impl JavaNotifier {
    pub fn new(support_class: String) -> Self {
        Self {
            support_class,
            active: None,
        }
    }
}

impl ChangeNotifier for JavaNotifier {
    fn start(&mut self, trigger: RawCallbackHandle) -> Result<(), Error> {
        let resolved = android_context().ok_or(Error::NoAndroidContext)?;
        let vm = unsafe { JavaVM::from_raw(resolved.vm)? };

        let object = {
            let mut env = vm.attach_current_thread()?;
            let class = env.find_class(self.support_class.as_str())?;
            // Safety: `resolved` keeps the context reference alive
            let context = unsafe { JObject::from_raw(resolved.context) };
            let local = env.new_object(&class, CONTEXT_CTOR_SIG, &[JValue::Object(&context)])?;
            let object = env.new_global_ref(local)?;
            env.call_method(
                &object,
                "startInterfaceWatch",
                "(J)V",
                &[JValue::Long(trigger.as_jlong())],
            )?;
            object
        };

        tracing::info!(class = %self.support_class, "java interface watch started");
        self.active = Some(JavaSupport { vm, object });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        let Some(support) = self.active.take() else {
            return Ok(());
        };
        let mut env = support.vm.attach_current_thread()?;
        env.call_method(&support.object, "stopInterfaceWatch", "()V", &[])?;
        tracing::info!("java interface watch stopped");
        Ok(())
    }
}
