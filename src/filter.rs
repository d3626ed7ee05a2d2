use crate::classifier::Candidate;
use crate::config::FilterConfig;

/// Drops low-confidence and known-noise labels from classifier output.
#[derive(Debug, Clone)]
pub struct ResultFilter {
    min_probability: f32,
    denylist: Vec<String>,
}

impl ResultFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            min_probability: config.min_probability,
            denylist: config.denylist.iter().map(|d| d.to_lowercase()).collect(),
        }
    }

    fn accepts(&self, candidate: &Candidate) -> bool {
        if candidate.probability <= self.min_probability {
            return false;
        }

        let label = candidate.label.to_lowercase();
        !self.denylist.iter().any(|noise| label.contains(noise.as_str()))
    }

    /// First surviving candidate. Input order is trusted to be the model's
    /// ranking, so this is the most confident acceptable label.
    pub fn filter(&self, candidates: &[Candidate]) -> Option<Candidate> {
        candidates.iter().find(|c| self.accepts(c)).cloned()
    }
}

/// Encyclopedia subject for a label: text before the first comma, trimmed.
/// ImageNet labels list synonyms as "tabby, tabby cat".
pub fn subject_from_label(label: &str) -> String {
    label.split(',').next().unwrap_or(label).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter() -> ResultFilter {
        ResultFilter::new(&FilterConfig::default())
    }

    #[test]
    fn test_picks_first_confident_candidate() {
        let candidates = vec![
            Candidate::new("golden retriever", 0.8),
            Candidate::new("Labrador retriever", 0.1),
        ];
        assert_eq!(filter().filter(&candidates), Some(Candidate::new("golden retriever", 0.8)));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let candidates = vec![Candidate::new("tabby", 0.15), Candidate::new("tiger cat", 0.1)];
        assert_eq!(filter().filter(&candidates), None);

        let candidates = vec![Candidate::new("tabby", 0.1501)];
        assert!(filter().filter(&candidates).is_some());
    }

    #[test]
    fn test_denylist_is_case_insensitive_substring() {
        let candidates = vec![
            Candidate::new("Nematode, nematode worm", 0.6),
            Candidate::new("BACKGROUND", 0.3),
            Candidate::new("hen", 0.2),
        ];
        assert_eq!(filter().filter(&candidates).map(|c| c.label), Some("hen".to_string()));
    }

    #[test]
    fn test_denylist_is_configurable() {
        let config = FilterConfig {
            denylist: vec!["Web Site".to_string()],
            ..Default::default()
        };
        let candidates = vec![Candidate::new("web site, website", 0.9), Candidate::new("nematode", 0.5)];
        let picked = ResultFilter::new(&config).filter(&candidates);
        assert_eq!(picked.map(|c| c.label), Some("nematode".to_string()));
    }

    #[test]
    fn test_filter_is_idempotent() {
        let candidates = vec![
            Candidate::new("background", 0.5),
            Candidate::new("koala", 0.4),
            Candidate::new("wombat", 0.05),
        ];
        let first = filter().filter(&candidates).unwrap();
        let second = filter().filter(std::slice::from_ref(&first)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_input_yields_none() {
        assert_eq!(filter().filter(&[]), None);
    }

    #[test]
    fn test_subject_from_label() {
        assert_eq!(subject_from_label("golden retriever"), "golden retriever");
        assert_eq!(subject_from_label(" tabby, tabby cat"), "tabby");
        assert_eq!(subject_from_label("African elephant, Loxodonta africana"), "African elephant");
    }
}
