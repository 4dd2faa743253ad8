//! `profiles` and `user_roles`, read only.

use crate::principal::{Principal, Role};
use crate::{ClinicError, ClinicResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Load a user's profile together with their role grants.
///
/// Returns `None` when no profile row exists. A profile without grants yields a principal with
/// an empty role list.
pub fn load_principal(conn: &Connection, user_id: &str) -> ClinicResult<Option<Principal>> {
    let profile = conn
        .query_row(
            "SELECT id, full_name, phone FROM profiles WHERE id = ?1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, Option<String>>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )
        .optional()?;

    let Some((user_id, full_name, phone)) = profile else {
        return Ok(None);
    };

    let mut stmt =
        conn.prepare("SELECT role FROM user_roles WHERE user_id = ?1 ORDER BY role")?;
    let rows = stmt.query_map(params![user_id], |row| row.get::<_, String>(0))?;

    let mut roles = Vec::new();
    for role in rows {
        let role = role?;
        let role: Role = role.parse().map_err(|_| ClinicError::CorruptRow {
            table: "user_roles",
            reason: format!("unknown role '{}'", role),
        })?;
        roles.push(role);
    }
    roles.sort();

    Ok(Some(Principal {
        user_id,
        full_name,
        phone,
        roles,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_principal, test_db};

    #[test]
    fn unknown_user_has_no_principal() {
        let (_dir, conn) = test_db();
        assert!(load_principal(&conn, "nobody").unwrap().is_none());
    }

    #[test]
    fn principal_carries_profile_and_roles() {
        let (_dir, conn) = test_db();
        seed_principal(
            &conn,
            "doc-1",
            Some("Dr. Amanda Wijaya"),
            &[Role::Owner, Role::Doctor],
        );

        let principal = load_principal(&conn, "doc-1").unwrap().unwrap();
        assert_eq!(principal.full_name.as_deref(), Some("Dr. Amanda Wijaya"));
        assert_eq!(principal.roles, vec![Role::Doctor, Role::Owner]);
    }

    #[test]
    fn profile_without_grants_has_no_roles() {
        let (_dir, conn) = test_db();
        seed_principal(&conn, "walk-in", None, &[]);
        let principal = load_principal(&conn, "walk-in").unwrap().unwrap();
        assert!(principal.roles.is_empty());
        assert_eq!(principal.display_name(), "walk-in");
    }
}
