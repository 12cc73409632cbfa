//! Field merge for partial updates.
//!
//! An incoming value replaces the stored one only when it is present,
//! non-blank and different. Which fields take part is decided by the
//! per-entity allow-lists below; anything not listed is never touched by an
//! update.

use crate::models::astronaut::canonical;
use crate::models::{Astronaut, AstronautUpdate, Role, User, UserUpdate};

/// Values that count as "not provided" when blank.
pub trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl Blank for i32 {
    fn is_blank(&self) -> bool {
        *self == 0
    }
}

impl Blank for Role {
    fn is_blank(&self) -> bool {
        false
    }
}

/// Adopts `incoming` into `current`; returns whether the value changed.
pub fn adopt<T: Blank + PartialEq>(current: &mut T, incoming: Option<T>) -> bool {
    match incoming {
        Some(value) if !value.is_blank() && value != *current => {
            *current = value;
            true
        }
        _ => false,
    }
}

/// One mergeable field of `B` fed from a patch of type `P`.
pub struct MergeField<B, P> {
    pub name: &'static str,
    pub apply: fn(&mut B, &P) -> bool,
}

/// Applies every field in `fields` and returns the names that changed.
pub fn merge<B, P>(baseline: &mut B, patch: &P, fields: &[MergeField<B, P>]) -> Vec<&'static str> {
    fields
        .iter()
        .filter_map(|field| (field.apply)(baseline, patch).then_some(field.name))
        .collect()
}

/// User fields an update may change. Password and API key have dedicated
/// operations. The role patch is parsed before merging, so this list takes
/// the already-typed role alongside the raw payload.
pub const USER_UPDATE_FIELDS: &[MergeField<User, UserPatch>] = &[
    MergeField {
        name: "firstName",
        apply: |user, patch| adopt(&mut user.first_name, patch.first_name.clone()),
    },
    MergeField {
        name: "surname",
        apply: |user, patch| adopt(&mut user.surname, patch.surname.clone()),
    },
    MergeField {
        name: "email",
        apply: |user, patch| adopt(&mut user.email, patch.email.clone()),
    },
    MergeField {
        name: "role",
        apply: |user, patch| adopt(&mut user.role, patch.role),
    },
];

/// Astronaut fields an update may change. Birth date is fixed at creation.
pub const ASTRONAUT_UPDATE_FIELDS: &[MergeField<Astronaut, AstronautUpdate>] = &[
    MergeField {
        name: "name",
        apply: |a, patch| adopt(&mut a.name, patch.name.clone()),
    },
    MergeField {
        name: "year",
        apply: |a, patch| adopt(&mut a.year, patch.year),
    },
    MergeField {
        name: "group",
        apply: |a, patch| adopt(&mut a.group, patch.group),
    },
    MergeField {
        name: "status",
        apply: |a, patch| adopt(&mut a.status, patch.status.as_deref().map(canonical)),
    },
    MergeField {
        name: "birthPlace",
        apply: |a, patch| adopt(&mut a.birth_place, patch.birth_place.clone()),
    },
    MergeField {
        name: "gender",
        apply: |a, patch| adopt(&mut a.gender, patch.gender.as_deref().map(canonical)),
    },
];

/// A [`UserUpdate`] whose role has been parsed.
#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl UserPatch {
    #[must_use]
    pub fn new(update: UserUpdate, role: Option<Role>) -> Self {
        Self {
            first_name: update.first_name,
            surname: update.surname,
            email: update.email,
            role,
        }
    }
}
