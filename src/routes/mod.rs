/// Router Module Index
///
/// Splits the gateway's routes by who may reach them. Access is decided by
/// the navigation guard wrapped around the whole router; the split here only
/// mirrors the guard's public/protected prefix lists.

/// Session forms, login/registration/logout and the health check.
pub mod public;

/// Pages that need a session credential (the post listing and post creation).
pub mod authenticated;
