use crate::normalize::normalize;
use crate::types::CanonicalSite;
use tracing::debug;

/// Matching strategies for resolving a legacy location to a registry site,
/// in precedence order. Earlier strategies always win; the cascade must not
/// be reordered or evaluated in parallel, since callers rely on the same
/// site being returned for the same inputs on every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Normalized location equals the normalized site name.
    Exact,
    /// Either normalized string contains the other.
    Containment,
    /// The site slug contains the location text rewritten slug-style.
    SlugFuzzy,
}

impl MatchStrategy {
    pub const CASCADE: [MatchStrategy; 3] = [
        MatchStrategy::Exact,
        MatchStrategy::Containment,
        MatchStrategy::SlugFuzzy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MatchStrategy::Exact => "exact",
            MatchStrategy::Containment => "containment",
            MatchStrategy::SlugFuzzy => "slug-fuzzy",
        }
    }

    /// `location` must already be normalized and non-empty.
    fn matches(self, location: &str, site: &CanonicalSite) -> bool {
        match self {
            MatchStrategy::Exact => normalize(&site.name) == location,
            MatchStrategy::Containment => {
                let name = normalize(&site.name);
                !name.is_empty() && (name.contains(location) || location.contains(name.as_str()))
            }
            MatchStrategy::SlugFuzzy => {
                // Slugs are already hyphen-joined; running them through the
                // normalizer would fold the hyphens away and make the needle
                // unmatchable, so they are only case-folded and trimmed here.
                let needle = location.replace(' ', "-");
                site.slug.trim().to_lowercase().contains(&needle)
            }
        }
    }
}

/// Resolve a free-text legacy location to exactly one site, scanning sites
/// in catalog order under each strategy and stopping at the first success.
/// `None` is the valid "unmatched" outcome, not an error. Blank locations
/// never match.
pub fn match_site<'a>(location: &str, sites: &'a [CanonicalSite]) -> Option<&'a CanonicalSite> {
    let location = normalize(location);
    if location.is_empty() {
        return None;
    }

    for strategy in MatchStrategy::CASCADE {
        if let Some(site) = sites.iter().find(|site| strategy.matches(&location, site)) {
            debug!(
                "Matched \"{}\" to site {} ({}) via {} strategy",
                location,
                site.id,
                site.name,
                strategy.name()
            );
            return Some(site);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(id: i64, name: &str, slug: &str) -> CanonicalSite {
        CanonicalSite {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
        }
    }

    #[test]
    fn exact_match_ignores_case_and_punctuation() {
        let sites = vec![site(7, "Shangri-La North Lake", "shangri-la-north-lake")];
        let matched = match_site("Shangri-La, North Lake", &sites).unwrap();
        assert_eq!(matched.id, 7);
    }

    #[test]
    fn exact_beats_containment() {
        // "East Basin" matches site 2 exactly, while site 1 would match by
        // containment; the cascade must prefer the exact hit.
        let sites = vec![
            site(1, "East Basin Overflow", "east-basin-overflow"),
            site(2, "East Basin", "east-basin"),
        ];
        let matched = match_site("East Basin", &sites).unwrap();
        assert_eq!(matched.id, 2);
    }

    #[test]
    fn containment_matches_either_direction() {
        let sites = vec![site(3, "Mill Creek", "mill-creek")];
        assert_eq!(match_site("Mill Creek South Annex", &sites).unwrap().id, 3);
        assert_eq!(match_site("Creek", &sites).unwrap().id, 3);
    }

    #[test]
    fn slug_strategy_catches_renamed_sites() {
        // Display name diverged from the slug; only the slug still carries
        // the legacy wording.
        let sites = vec![site(4, "Parcel B-12", "old-mill-pond-parcel-b12")];
        let matched = match_site("Old Mill Pond", &sites).unwrap();
        assert_eq!(matched.id, 4);
    }

    #[test]
    fn unmatched_returns_none() {
        let sites = vec![site(5, "Cedar Flats", "cedar-flats")];
        assert!(match_site("Juniper Ridge", &sites).is_none());
    }

    #[test]
    fn blank_location_never_matches() {
        let sites = vec![site(6, "Cedar Flats", "cedar-flats")];
        assert!(match_site("", &sites).is_none());
        assert!(match_site("   ", &sites).is_none());
    }

    #[test]
    fn same_inputs_resolve_to_same_site() {
        let sites = vec![
            site(1, "North Field", "north-field"),
            site(2, "North Field Annex", "north-field-annex"),
        ];
        let first = match_site("North Field", &sites).unwrap().id;
        for _ in 0..10 {
            assert_eq!(match_site("North Field", &sites).unwrap().id, first);
        }
    }
}
