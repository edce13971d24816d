//! ZwiftPower endpoints, page labels and output column names.

pub const BASE_URL: &str = "https://zwiftpower.com";

/// Entry point of the Zwift SSO flow. Answers with a redirect to the identity provider.
pub const SSO_LOGIN_URL: &str =
    "https://zwiftpower.com/ucp.php?mode=login&login=external&oauth_service=oauthzpsso";

pub const HOME_URL: &str = "https://zwiftpower.com/";

/// Present on the home page only when logged in.
pub const LOGOUT_MARKER: &str = "Logout";
pub const PROFILE_LINK_MARKER: &str = "profile.php";

// Profile table labels
pub const CATEGORY_LABEL: &str = "Category (Pace Group)";
pub const CATEGORY_SPAN_PREFIX: &str = "label-cat-";
pub const FTP_LABEL: &str = "zFTP";
pub const RACING_SCORE_LABEL: &str = "Zwift Racing Score";

// Login form fields
pub const USERNAME_FIELD: &str = "username";
pub const PASSWORD_FIELD: &str = "password";
pub const REMEMBER_ME_FIELD: &str = "rememberMe";

/// Column holding the rider identifier in the input table.
pub const ID_COLUMN: &str = "ZwiftID";

/// Columns appended to every output row, in this order.
pub const OUTPUT_COLUMNS: [&str; 4] = ["Category", "Races", "zFTP", "ZwiftRacingScore"];

/// Build rider profile URL
pub fn profile_url(rider_id: &str) -> String {
    format!("{}/profile.php?z={}", BASE_URL, urlencoding::encode(rider_id))
}
