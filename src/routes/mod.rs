/// Router Module Index
///
/// Splits the route table by access level. Access control is applied to a whole
/// module with an Axum layer, so a protected endpoint cannot be registered by
/// accident on the public side.

/// Routes reachable by anonymous and signed-in clients alike.
pub mod public;

/// Routes behind the authorization gate: anonymous clients are redirected to `/login`.
pub mod authenticated;
