//! Utility macros for reducing boilerplate

/// Implement `FromRef<AppState>` for a field of [`AppState`](crate::state::AppState).
///
/// # Example
/// ```ignore
/// impl_from_ref!(ProjectRepository, repository);
/// // Expands to:
/// impl axum::extract::FromRef<AppState> for ProjectRepository {
///     fn from_ref(state: &AppState) -> Self {
///         state.repository.clone()
///     }
/// }
/// ```
#[macro_export]
macro_rules! impl_from_ref {
    ($type:ty, $field:ident) => {
        impl axum::extract::FromRef<$crate::state::AppState> for $type {
            fn from_ref(state: &$crate::state::AppState) -> Self {
                state.$field.clone()
            }
        }
    };
}
