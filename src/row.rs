use std::borrow::Cow;
use std::fmt;

use thiserror::Error;

use crate::constants::*;

/// A fixed-width record: an id plus two zero-padded text slots.
#[derive(Clone, PartialEq, Eq)]
pub struct Row {
    pub id: u32,
    username: [u8; USERNAME_SIZE],
    email: [u8; EMAIL_SIZE],
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("{field} is {len} bytes long (max {max})")]
    StringTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },
}

impl Row {
    pub fn new(id: u32, username: &str, email: &str) -> Result<Self, RowError> {
        Ok(Row {
            id,
            username: fill_slot::<USERNAME_SIZE>("username", username.as_bytes())?,
            email: fill_slot::<EMAIL_SIZE>("email", email.as_bytes())?,
        })
    }

    /// Username bytes with the zero padding stripped.
    pub fn username_bytes(&self) -> &[u8] {
        trim_slot(&self.username)
    }

    pub fn email_bytes(&self) -> &[u8] {
        trim_slot(&self.email)
    }

    pub fn username(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.username_bytes())
    }

    pub fn email(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.email_bytes())
    }
}

fn fill_slot<const N: usize>(field: &'static str, bytes: &[u8]) -> Result<[u8; N], RowError> {
    if bytes.len() > N {
        return Err(RowError::StringTooLong {
            field,
            len: bytes.len(),
            max: N,
        });
    }
    let mut slot = [0u8; N];
    slot[..bytes.len()].copy_from_slice(bytes);
    Ok(slot)
}

fn trim_slot(slot: &[u8]) -> &[u8] {
    let end = slot.iter().position(|&b| b == 0).unwrap_or(slot.len());
    &slot[..end]
}

impl fmt::Debug for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Row")
            .field("id", &self.id)
            .field("username", &self.username())
            .field("email", &self.email())
            .finish()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.id, self.username(), self.email())
    }
}

/// Writes `row` into the first `ROW_SIZE` bytes of `destination`.
///
/// Slots are copied whole, so unused text bytes land on disk as zeros.
pub fn serialize_row(row: &Row, destination: &mut [u8]) {
    destination[ID_OFFSET..USERNAME_OFFSET].copy_from_slice(&row.id.to_le_bytes());
    destination[USERNAME_OFFSET..EMAIL_OFFSET].copy_from_slice(&row.username);
    destination[EMAIL_OFFSET..ROW_SIZE].copy_from_slice(&row.email);
}

pub fn deserialize_row(source: &[u8]) -> Row {
    let mut id = [0u8; ID_SIZE];
    let mut username = [0u8; USERNAME_SIZE];
    let mut email = [0u8; EMAIL_SIZE];

    id.copy_from_slice(&source[ID_OFFSET..USERNAME_OFFSET]);
    username.copy_from_slice(&source[USERNAME_OFFSET..EMAIL_OFFSET]);
    email.copy_from_slice(&source[EMAIL_OFFSET..ROW_SIZE]);

    Row {
        id: u32::from_le_bytes(id),
        username,
        email,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn serialize_zero_fills_unused_bytes() {
        let row = Row::new(7, "alice", "alice@example.com").unwrap();
        let mut buf = [0xffu8; ROW_SIZE];
        serialize_row(&row, &mut buf);

        assert_eq!(&buf[..USERNAME_OFFSET], &7u32.to_le_bytes());
        assert_eq!(&buf[USERNAME_OFFSET..USERNAME_OFFSET + 5], b"alice");
        assert!(buf[USERNAME_OFFSET + 5..EMAIL_OFFSET].iter().all(|&b| b == 0));
        assert!(buf[EMAIL_OFFSET + 17..].iter().all(|&b| b == 0));

        let back = deserialize_row(&buf);
        assert_eq!(back, row);
        assert_eq!(back.username(), "alice");
        assert_eq!(back.email(), "alice@example.com");
    }

    #[test]
    fn username_at_slot_width_is_accepted() {
        let name = "a".repeat(USERNAME_SIZE);
        let row = Row::new(1, &name, "e").unwrap();
        assert_eq!(row.username(), name);

        let too_long = "a".repeat(USERNAME_SIZE + 1);
        assert_eq!(
            Row::new(1, &too_long, "e"),
            Err(RowError::StringTooLong {
                field: "username",
                len: USERNAME_SIZE + 1,
                max: USERNAME_SIZE,
            })
        );
    }

    #[test]
    fn email_over_slot_width_is_rejected() {
        assert!(Row::new(1, "u", &"e".repeat(EMAIL_SIZE)).is_ok());
        assert!(matches!(
            Row::new(1, "u", &"e".repeat(EMAIL_SIZE + 1)),
            Err(RowError::StringTooLong { field: "email", .. })
        ));
    }

    #[test]
    fn display_prints_tuple() {
        let row = Row::new(1, "user1", "person1@example.com").unwrap();
        assert_eq!(row.to_string(), "(1, user1, person1@example.com)");
    }

    proptest! {
        #[test]
        fn serialized_rows_read_back_unchanged(
            id in any::<u32>(),
            username in "[a-z0-9]{0,32}",
            email in "[a-z0-9@.]{0,255}",
        ) {
            let row = Row::new(id, &username, &email).unwrap();
            let mut buf = [0u8; ROW_SIZE];
            serialize_row(&row, &mut buf);
            let back = deserialize_row(&buf);
            prop_assert_eq!(&back, &row);
            prop_assert_eq!(back.username_bytes(), username.as_bytes());
            prop_assert_eq!(back.email_bytes(), email.as_bytes());
        }
    }
}
