//! Structural requirements for COM activation.
//!
//! COM creates instances through a class factory that can only call a public parameterless
//! constructor of a concrete, closed class. Types that cannot be activated this way are
//! never registered, whatever their attributes say.

use log::trace;

use crate::metadata::typedef::{
    MethodAccessFlags, MethodDefinition, MethodModifiers, TypeAttributes, TypeDefinition,
};

/// Returns `true` if instances of `definition` can be created by COM.
///
/// The type must be public, not abstract, not generic, and declare a public parameterless
/// instance constructor.
#[must_use]
pub fn is_com_eligible(definition: &TypeDefinition) -> bool {
    if definition.visibility() != TypeAttributes::PUBLIC {
        trace!("{} is not public", definition.full_name());
        return false;
    }

    if definition.is_abstract() {
        trace!("{} is abstract", definition.full_name());
        return false;
    }

    if definition.generic_param_count != 0 {
        trace!("{} is generic", definition.full_name());
        return false;
    }

    if !definition
        .constructors()
        .any(is_public_parameterless_constructor)
    {
        trace!(
            "{} has no public parameterless constructor",
            definition.full_name()
        );
        return false;
    }

    true
}

fn is_public_parameterless_constructor(method: &MethodDefinition) -> bool {
    !method.modifiers().contains(MethodModifiers::STATIC)
        && method.access() == MethodAccessFlags::PUBLIC
        && method.param_count == 0
}
