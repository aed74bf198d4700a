//! User accounts, password handling and cookie based authentication.

mod cookie;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register_user;
mod token;
mod user;

pub use cookie::{
    COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, SessionConfig, extend_auth_cookie_duration_if_needed,
    get_token_from_cookies, invalidate_auth_cookie, set_auth_cookie,
};
pub use log_in::{LoginState, get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{auth_guard, auth_guard_hx};
pub use password::{MIN_PASSWORD_LENGTH, PasswordHash, ValidatedPassword};
pub use redirect::normalize_redirect_url;
pub use register_user::{RegistrationState, get_register_page, register_user};
pub use token::Token;
pub use user::{
    User, UserID, count_users, create_user, create_user_table, get_user_by_id,
    get_user_by_username, update_password, validate_email,
};
