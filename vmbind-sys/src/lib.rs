//! # Shared FFI Types (HotSpot ↔ Agent)
//!
//! Primitive JNI types and opaque handles used by the typed signatures of the
//! bound HotSpot entry points. Widths follow `jni.h` / `jni_md.h` on Linux:
//! `jint` is always 32-bit, `jlong` always 64-bit, `jboolean` an unsigned byte.
//!
//! Handles are raw pointers into the runtime. Nothing here dereferences them;
//! validity is the caller's contract with the JVM.

#![no_std]
#![allow(non_camel_case_types)]

use core::ffi::c_void;

// ============================================================================
// Primitive Types
// ============================================================================

pub type jint = i32;
pub type jlong = i64;
pub type jboolean = u8;

/// `jvmtiError` as returned by `JvmtiEnv` member functions
pub type jvmtiError = jint;

// ============================================================================
// Opaque Handles
// ============================================================================

/// Local or global JNI reference (`jobject`)
pub type jobject = *mut c_void;

/// Opaque `JNIEnv`; only ever passed through to the runtime
#[repr(C)]
pub struct JNIEnv {
    _private: [u8; 0],
}

/// Raw `oopDesc*` (an uncompressed, unhandled object pointer)
pub type oop = *mut c_void;

/// Raw `Klass*` / `klassOop`, depending on runtime era
pub type KlassPtr = *mut c_void;

/// `this` pointer of a C++ receiver (`JvmtiEnv*`, `CollectedHeap*`, ...)
pub type ThisPtr = *mut c_void;

// ============================================================================
// Internal Entry Point Signatures
// ============================================================================
//
// Member functions use the Itanium C++ ABI, where `this` is the first
// argument; on Linux that is the platform C calling convention.

/// `jvmtiError JvmtiEnv::GetObjectSize(jobject object, jlong* size_ptr)`
pub type GetObjectSizeFn =
    unsafe extern "C" fn(this: ThisPtr, object: jobject, size_ptr: *mut jlong) -> jvmtiError;

/// `java_lang_Class::as_Klass(oop)` / legacy `as_klassOop(oopDesc*)`
pub type AsKlassFn = unsafe extern "C" fn(mirror: oop) -> KlassPtr;

/// `InstanceKlass::klass_holder()` / legacy `instanceKlass::class_loader()`, and
/// the object-array equivalents
pub type ClassLoaderFn = unsafe extern "C" fn(klass: KlassPtr) -> oop;

/// `java_lang_Thread::thread_id(oop)`
pub type ThreadIdFn = unsafe extern "C" fn(thread_oop: oop) -> jlong;

/// `Unsafe_Park(JNIEnv*, jobject, jboolean, jlong)`
pub type UnsafeParkFn =
    unsafe extern "C" fn(env: *mut JNIEnv, unsafe_obj: jobject, is_absolute: jboolean, time: jlong);

/// `bool CollectedHeap::is_in_permanent(const void*) const`
pub type IsInPermanentFn = unsafe extern "C" fn(this: ThisPtr, p: *const c_void) -> bool;
