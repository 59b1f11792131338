//! Picks one model id from a preference list and a provider's live catalog.

use crate::error::LingoError;

/// Returns the first preferred id present in `catalog`, else the catalog's first id.
///
/// Blank preferred entries are skipped so an unset override can be passed straight
/// through. The catalog is enumerated in the order the provider reported it; callers
/// must fetch it fresh for every request.
pub fn resolve<P, C>(preferred: &[P], catalog: &[C]) -> Result<String, LingoError>
where
    P: AsRef<str>,
    C: AsRef<str>,
{
    let chosen = preferred
        .iter()
        .map(AsRef::as_ref)
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .find(|candidate| catalog.iter().any(|id| id.as_ref() == *candidate))
        .or_else(|| catalog.first().map(AsRef::as_ref));

    chosen
        .map(str::to_string)
        .ok_or(LingoError::NoAvailableModel)
}

/// Builds a candidate list led by an optional override.
pub fn with_override(override_id: Option<&str>, defaults: &[&str]) -> Vec<String> {
    override_id
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .into_iter()
        .chain(defaults.iter().copied())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_preferred_in_catalog_wins() {
        let chosen = resolve(&["modelA", "modelB"], &["modelB", "modelC"]).expect("resolve");
        assert_eq!(chosen, "modelB");
    }

    #[test]
    fn head_of_preferred_wins_when_present() {
        let chosen = resolve(&["modelC", "modelB"], &["modelB", "modelC"]).expect("resolve");
        assert_eq!(chosen, "modelC");
    }

    #[test]
    fn falls_back_to_catalog_head() {
        let chosen = resolve(&["modelA"], &["modelX", "modelY"]).expect("resolve");
        assert_eq!(chosen, "modelX");
        let chosen = resolve::<&str, &str>(&[], &["modelY"]).expect("resolve");
        assert_eq!(chosen, "modelY");
    }

    #[test]
    fn empty_catalog_fails() {
        let err = resolve::<&str, &str>(&["modelA"], &[]).expect_err("empty catalog");
        assert!(matches!(err, LingoError::NoAvailableModel));
    }

    #[test]
    fn blank_preferred_is_skipped() {
        let chosen = resolve(&["", "  ", "modelB"], &["modelA", "modelB"]).expect("resolve");
        assert_eq!(chosen, "modelB");
    }

    #[test]
    fn result_is_always_in_catalog() {
        let catalogs: [&[&str]; 3] = [&["a"], &["b", "a"], &["c", "d", "e"]];
        let preferred = ["x", "a", "d"];
        for catalog in catalogs {
            let chosen = resolve(&preferred, catalog).expect("resolve");
            assert!(catalog.contains(&chosen.as_str()));
        }
    }

    #[test]
    fn override_leads_candidates() {
        assert_eq!(
            with_override(Some(" custom/model "), &["a", "b"]),
            vec!["custom/model", "a", "b"]
        );
        assert_eq!(with_override(Some(""), &["a"]), vec!["a"]);
        assert_eq!(with_override(None, &["a"]), vec!["a"]);
    }
}
