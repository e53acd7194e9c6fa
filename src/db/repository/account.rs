use std::str::FromStr;

use chrono::Utc;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use uuid::Uuid;

use super::appointment::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::*;

/// Insert an account. A taken username surfaces as `ConstraintViolation`.
pub fn insert_account(conn: &Connection, new: &NewAccount) -> Result<String, DatabaseError> {
    let id = Uuid::new_v4().to_string();
    let result = conn.execute(
        "INSERT INTO accounts (id, role, name, surname, email, phone_number, address, username, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            id,
            new.role.as_str(),
            new.name,
            new.surname,
            new.email,
            new.phone_number,
            new.address,
            new.username,
            new.password_hash,
            format_timestamp(&Utc::now()),
        ],
    );

    match result {
        Ok(_) => Ok(id),
        Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
            Err(DatabaseError::ConstraintViolation(format!(
                "username already taken: {}",
                new.username
            )))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn find_account_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<Account>, DatabaseError> {
    let row = conn
        .query_row(
            "SELECT id, role, name, surname, email, phone_number, address, username, password_hash, created_at
             FROM accounts WHERE username = ?1",
            params![username],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, String>(9)?,
                ))
            },
        )
        .optional()?;

    let Some((id, role, name, surname, email, phone_number, address, username, password_hash, created_at)) =
        row
    else {
        return Ok(None);
    };

    Ok(Some(Account {
        id,
        role: Role::from_str(&role)?,
        name,
        surname,
        email,
        phone_number,
        address,
        username,
        password_hash,
        created_at: parse_timestamp("created_at", &created_at)?,
    }))
}

pub fn update_password_hash(
    conn: &Connection,
    id: &str,
    password_hash: &str,
) -> Result<(), DatabaseError> {
    let changed = conn.execute(
        "UPDATE accounts SET password_hash = ?1 WHERE id = ?2",
        params![password_hash, id],
    )?;
    if changed == 0 {
        return Err(DatabaseError::NotFound {
            entity_type: "Account".into(),
            id: id.into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;

    fn new_account(username: &str) -> NewAccount {
        NewAccount {
            role: Role::Patient,
            name: "Thandi".into(),
            surname: Some("Zulu".into()),
            email: "thandi@example.com".into(),
            phone_number: "0821234567".into(),
            address: None,
            username: username.into(),
            password_hash: "hash".into(),
        }
    }

    #[test]
    fn insert_and_find_by_username() {
        let conn = open_memory_database().unwrap();
        let id = insert_account(&conn, &new_account("thandi")).unwrap();

        let account = find_account_by_username(&conn, "thandi").unwrap().unwrap();
        assert_eq!(account.id, id);
        assert_eq!(account.role, Role::Patient);
        assert_eq!(account.surname.as_deref(), Some("Zulu"));
    }

    #[test]
    fn duplicate_username_is_constraint_violation() {
        let conn = open_memory_database().unwrap();
        insert_account(&conn, &new_account("thandi")).unwrap();
        let err = insert_account(&conn, &new_account("thandi")).unwrap_err();
        assert!(matches!(err, DatabaseError::ConstraintViolation(_)));
    }

    #[test]
    fn update_password_for_unknown_id() {
        let conn = open_memory_database().unwrap();
        let err = update_password_hash(&conn, "nobody", "x").unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { .. }));
    }
}
