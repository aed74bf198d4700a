//! The session token stored in the encrypted auth cookie.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::UserID;

// Hours are always written with two digits so that expiries at midnight parse again.
time::serde::format_description!(
    expiry_format,
    OffsetDateTime,
    "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond] \
     [offset_hour sign:mandatory]:[offset_minute]:[offset_second]"
);

/// Who is logged in and until when.
///
/// The token is stored as JSON in a private cookie, so the client can neither read nor forge it.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Token {
    pub user_id: UserID,

    /// The instant after which the token is no longer accepted, in the server's local offset.
    #[serde(with = "expiry_format")]
    pub expires_at: OffsetDateTime,
}
