//! Domain types providing compile-time safety and self-documentation
//!
//! Addresses, capabilities and collector variants are newtypes/enums so a
//! capability id can never be confused with a symbol name, and an address
//! in the live image never with a plain integer.

use std::fmt;
use std::str::FromStr;

/// Address in the host runtime's address space (pointer-sized)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address(pub usize);

impl Address {
    /// Add a byte offset, `None` on overflow
    #[must_use]
    pub fn checked_add(self, offset: usize) -> Option<Self> {
        self.0.checked_add(offset).map(Address)
    }

    #[must_use]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

impl From<usize> for Address {
    fn from(addr: usize) -> Self {
        Address(addr)
    }
}

/// Pointer width of the runtime image (ELF class)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerWidth {
    Bits32,
    Bits64,
}

impl PointerWidth {
    /// Width of the process this crate is compiled into
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_pointer_width = "64") {
            PointerWidth::Bits64
        } else {
            PointerWidth::Bits32
        }
    }

    /// Size of a pointer in bytes
    #[must_use]
    pub const fn bytes(self) -> usize {
        match self {
            PointerWidth::Bits32 => 4,
            PointerWidth::Bits64 => 8,
        }
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        match self {
            PointerWidth::Bits32 => 32,
            PointerWidth::Bits64 => 64,
        }
    }
}

impl fmt::Display for PointerWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Garbage-collector implementation compiled into (and active in) the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectorVariant {
    /// `ParallelScavengeHeap`
    Parallel,
    /// `SharedHeap` family (serial, CMS, G1 on older runtimes)
    SharedHeap,
    /// No known collector signature present
    Other,
}

impl CollectorVariant {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CollectorVariant::Parallel => "parallel",
            CollectorVariant::SharedHeap => "shared-heap",
            CollectorVariant::Other => "other",
        }
    }
}

impl fmt::Display for CollectorVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectorVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "parallel" => Ok(CollectorVariant::Parallel),
            "shared-heap" | "sharedheap" | "shared" => Ok(CollectorVariant::SharedHeap),
            "other" => Ok(CollectorVariant::Other),
            _ => Err(format!(
                "unknown collector variant '{s}' (expected parallel, shared-heap or other)"
            )),
        }
    }
}

/// Logical internal function or data accessor, independent of its linker name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// `JvmtiEnv::GetObjectSize`
    GetObjectSize,
    /// `java_lang_Class::as_Klass` / `as_klassOop`
    AsKlass,
    /// Class loader (holder) of an instance klass
    ClassLoaderForInstanceKlass,
    /// Class loader (holder) of an object-array klass
    ClassLoaderForObjArrayKlass,
    /// `java_lang_Thread::thread_id`
    ThreadId,
    /// `Unsafe_Park` native
    UnsafePark,
    /// `is_in_permanent` of the active heap
    IsInPermanent,
    /// Vtable of G1's evacuation scan closure
    G1ScanClosureVTable,
}

impl Capability {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Capability::GetObjectSize => "GetObjectSize",
            Capability::AsKlass => "AsKlass",
            Capability::ClassLoaderForInstanceKlass => "ClassLoaderForInstanceKlass",
            Capability::ClassLoaderForObjArrayKlass => "ClassLoaderForObjArrayKlass",
            Capability::ThreadId => "ThreadId",
            Capability::UnsafePark => "UnsafePark",
            Capability::IsInPermanent => "IsInPermanent",
            Capability::G1ScanClosureVTable => "G1ScanClosureVTable",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a capability's absence fails the whole registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    Mandatory,
    Optional,
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Requirement::Mandatory => f.write_str("mandatory"),
            Requirement::Optional => f.write_str("optional"),
        }
    }
}

/// Declared call signature of a bound entry point
///
/// Each variant corresponds to exactly one function pointer type in
/// `vmbind_sys`; the registry only ever casts an address to the type its
/// declared signature names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signature {
    ObjectSize,
    MirrorToKlass,
    ClassLoader,
    ThreadId,
    Park,
    IsInPermanent,
    VTable,
}

impl Signature {
    /// C-level rendering of the calling contract
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Signature::ObjectSize => "jvmtiError (JvmtiEnv*, jobject, jlong*)",
            Signature::MirrorToKlass => "Klass* (oop)",
            Signature::ClassLoader => "oop (Klass*)",
            Signature::ThreadId => "jlong (oop)",
            Signature::Park => "void (JNIEnv*, jobject, jboolean, jlong)",
            Signature::IsInPermanent => "bool (CollectedHeap*, const void*)",
            Signature::VTable => "void* [slot]",
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}
