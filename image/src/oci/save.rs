//! Naming of save/export destinations.

use super::resolve::ImageRecord;

/// Reference to record in an archive when saving `image`, which the user
/// referred to as `user_input`.
///
/// Returns `None` when the input is part of the image ID: an ID says
/// nothing about a name. Otherwise the input is returned, qualified with
/// `local_registry` when the image only carries that name under the local
/// registry, so that loading the archive later yields the same repotag.
pub fn save_destination_name<I: ImageRecord + ?Sized>(
    image: &I,
    user_input: &str,
    local_registry: &str,
) -> Option<String> {
    if image.id().contains(user_input) {
        return None;
    }

    let prefix = format!("{local_registry}/");
    if !user_input.starts_with(&prefix) {
        let latest = format!("{user_input}:latest");
        let local_only = image.names().iter().any(|name| {
            name.starts_with(&prefix) && (name.ends_with(user_input) || name.ends_with(&latest))
        });
        if local_only {
            tracing::debug!(input = %user_input, registry = %local_registry, "Qualifying save name");
            return Some(format!("{prefix}{user_input}"));
        }
    }

    Some(user_input.to_string())
}
