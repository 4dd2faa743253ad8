//! Authenticated principals and role checks.
//!
//! Identities, profiles and role grants are owned by the authentication provider. This module
//! only reads them back and answers "may this principal do X".

use crate::db::open_database;
use crate::repositories::profiles::load_principal;
use crate::{ClinicError, ClinicResult, CoreConfig};
use serde::Serialize;
use std::{fmt, str::FromStr};

/// Application role, mirroring the `app_role` vocabulary of the authentication provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Admin,
    Doctor,
    Pharmacist,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            Role::Pharmacist => "pharmacist",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ClinicError;

    fn from_str(s: &str) -> ClinicResult<Self> {
        match s {
            "patient" => Ok(Role::Patient),
            "admin" => Ok(Role::Admin),
            "doctor" => Ok(Role::Doctor),
            "pharmacist" => Ok(Role::Pharmacist),
            "owner" => Ok(Role::Owner),
            other => Err(ClinicError::InvalidInput(format!("unknown role '{}'", other))),
        }
    }
}

/// Things a principal can be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Register patients and read clinic records.
    Operate,
    /// Record examinations, diagnoses and prescriptions.
    Examine,
    /// Move prescriptions through fulfilment.
    Dispense,
}

impl Action {
    fn permitted_roles(&self) -> &'static [Role] {
        match self {
            Action::Operate => &[Role::Admin, Role::Doctor, Role::Pharmacist, Role::Owner],
            Action::Examine => &[Role::Doctor, Role::Admin, Role::Owner],
            Action::Dispense => &[Role::Pharmacist, Role::Admin, Role::Owner],
        }
    }

    fn describe(&self) -> &'static str {
        match self {
            Action::Operate => "access clinic records",
            Action::Examine => "record examinations",
            Action::Dispense => "dispense prescriptions",
        }
    }
}

/// An authenticated user with their profile and role grants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub user_id: String,
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub roles: Vec<Role>,
}

impl Principal {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Name recorded against the rows this principal authors.
    ///
    /// Falls back to the user id when the profile has no name.
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.user_id)
    }

    /// # Errors
    ///
    /// Returns `ClinicError::Forbidden` if none of the principal's roles permit `action`.
    pub fn authorise(&self, action: Action) -> ClinicResult<()> {
        if action
            .permitted_roles()
            .iter()
            .any(|role| self.has_role(*role))
        {
            return Ok(());
        }
        Err(ClinicError::Forbidden {
            user_id: self.user_id.clone(),
            action: action.describe(),
        })
    }
}

/// Resolve an identity issued by the authentication provider into a principal.
///
/// # Errors
///
/// - `ClinicError::Unauthenticated` if `user_id` is blank or has no profile.
/// - `ClinicError::Database` if the lookup fails.
pub fn resolve_principal(cfg: &CoreConfig, user_id: &str) -> ClinicResult<Principal> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(ClinicError::Unauthenticated("missing user id".into()));
    }
    let conn = open_database(cfg)?;
    load_principal(&conn, user_id)?
        .ok_or_else(|| ClinicError::Unauthenticated(format!("no profile for '{}'", user_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_principal, test_cfg};
    use tempfile::TempDir;

    fn principal(roles: Vec<Role>) -> Principal {
        Principal {
            user_id: "user-1".into(),
            full_name: Some("Dr. Amanda Wijaya".into()),
            phone: None,
            roles,
        }
    }

    #[test]
    fn doctor_may_examine_but_not_dispense() {
        let doctor = principal(vec![Role::Doctor]);
        assert!(doctor.authorise(Action::Examine).is_ok());
        assert!(doctor.authorise(Action::Operate).is_ok());
        assert!(matches!(
            doctor.authorise(Action::Dispense),
            Err(ClinicError::Forbidden { .. })
        ));
    }

    #[test]
    fn pharmacist_may_dispense_but_not_examine() {
        let pharmacist = principal(vec![Role::Pharmacist]);
        assert!(pharmacist.authorise(Action::Dispense).is_ok());
        assert!(pharmacist.authorise(Action::Examine).is_err());
    }

    #[test]
    fn patients_and_roleless_users_have_no_staff_rights() {
        for p in [principal(vec![Role::Patient]), principal(vec![])] {
            assert!(p.authorise(Action::Operate).is_err());
            assert!(p.authorise(Action::Examine).is_err());
            assert!(p.authorise(Action::Dispense).is_err());
        }
    }

    #[test]
    fn display_name_falls_back_to_user_id() {
        let mut p = principal(vec![]);
        assert_eq!(p.display_name(), "Dr. Amanda Wijaya");
        p.full_name = Some("   ".into());
        assert_eq!(p.display_name(), "user-1");
        p.full_name = None;
        assert_eq!(p.display_name(), "user-1");
    }

    #[test]
    fn role_parse_matches_vocabulary() {
        for role in [
            Role::Patient,
            Role::Admin,
            Role::Doctor,
            Role::Pharmacist,
            Role::Owner,
        ] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("nurse".parse::<Role>().is_err());
    }

    #[test]
    fn resolve_requires_a_profile() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let cfg = test_cfg(&dir);
        let conn = open_database(&cfg).unwrap();
        seed_principal(&conn, "pharm-1", Some("Budi"), &[Role::Pharmacist]);

        let principal = resolve_principal(&cfg, " pharm-1 ").unwrap();
        assert!(principal.has_role(Role::Pharmacist));

        assert!(matches!(
            resolve_principal(&cfg, "ghost"),
            Err(ClinicError::Unauthenticated(_))
        ));
        assert!(matches!(
            resolve_principal(&cfg, ""),
            Err(ClinicError::Unauthenticated(_))
        ));
    }
}
