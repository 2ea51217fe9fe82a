//! Controller list handling.
//!
//! Callers hand the factory either bare addresses or address/permission
//! pairs. Both forms are resolved once into canonical entries before any
//! encoding runs; order is preserved because it determines the storage
//! array indices.

use alloy_primitives::Address;

use crate::error::{FactoryError, FactoryResult};
use crate::permissions::Permissions;

/// A controller as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Controller {
    /// Bare address, granted [`Permissions::DEFAULT_CONTROLLER`].
    Address(Address),
    /// Address with an explicit permission bitmask.
    WithPermissions {
        /// The controller address.
        address: Address,
        /// The requested permission bitmask.
        permissions: Permissions,
    },
}

impl Controller {
    /// The controller's address regardless of form.
    pub fn address(&self) -> Address {
        match self {
            Self::Address(address) => *address,
            Self::WithPermissions { address, .. } => *address,
        }
    }
}

impl From<Address> for Controller {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

/// A controller resolved to its canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerEntry {
    /// The controller address.
    pub address: Address,
    /// The permission bitmask to store for it.
    pub permissions: Permissions,
}

/// Resolves a caller-supplied controller list into canonical entries.
///
/// Rejects zero addresses and duplicates; an empty list is allowed (the
/// deploying signer still receives its synthetic handoff entry).
pub fn resolve_controllers(controllers: &[Controller]) -> FactoryResult<Vec<ControllerEntry>> {
    let mut entries = Vec::with_capacity(controllers.len());

    for controller in controllers {
        let entry = match controller {
            Controller::Address(address) => ControllerEntry {
                address: *address,
                permissions: Permissions::DEFAULT_CONTROLLER,
            },
            Controller::WithPermissions { address, permissions } => ControllerEntry {
                address: *address,
                permissions: *permissions,
            },
        };

        if entry.address == Address::ZERO {
            return Err(FactoryError::Controller("zero address".to_string()));
        }
        if entries.iter().any(|existing: &ControllerEntry| existing.address == entry.address) {
            return Err(FactoryError::Controller(format!(
                "duplicate controller {}",
                entry.address
            )));
        }

        entries.push(entry);
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use alloy_primitives::address;

    use super::*;

    const A: Address = address!("00000000000000000000000000000000000000aa");
    const B: Address = address!("00000000000000000000000000000000000000bb");

    #[test]
    fn test_bare_address_gets_default_permissions() {
        let entries = resolve_controllers(&[Controller::Address(A)]).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].address, A);
        assert_eq!(entries[0].permissions, Permissions::DEFAULT_CONTROLLER);
    }

    #[test]
    fn test_explicit_permissions_preserved() {
        let entries = resolve_controllers(&[
            Controller::Address(A),
            Controller::WithPermissions { address: B, permissions: Permissions::SET_DATA },
        ])
        .unwrap();
        assert_eq!(entries[1].permissions, Permissions::SET_DATA);
    }

    #[test]
    fn test_order_preserved() {
        let entries =
            resolve_controllers(&[Controller::Address(B), Controller::Address(A)]).unwrap();
        assert_eq!(entries[0].address, B);
        assert_eq!(entries[1].address, A);
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = resolve_controllers(&[
            Controller::Address(A),
            Controller::WithPermissions { address: A, permissions: Permissions::SIGN },
        ]);
        assert!(matches!(result, Err(FactoryError::Controller(_))));
    }

    #[test]
    fn test_zero_address_rejected() {
        let result = resolve_controllers(&[Controller::Address(Address::ZERO)]);
        assert!(matches!(result, Err(FactoryError::Controller(_))));
    }

    #[test]
    fn test_empty_list_allowed() {
        assert!(resolve_controllers(&[]).unwrap().is_empty());
    }
}
