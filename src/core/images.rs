use std::collections::{BTreeMap, HashMap};

/// Data-URI images keyed by carousel id, then slide number.
///
/// Entries arrive asynchronously and are never required to be complete.
/// Concurrent writes for the same slide are last-write-wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageCache {
    by_carousel: HashMap<String, BTreeMap<u32, String>>,
}

impl ImageCache {
    pub fn get(&self, carousel_id: &str, slide_number: u32) -> Option<&str> {
        self.by_carousel
            .get(carousel_id)
            .and_then(|slides| slides.get(&slide_number))
            .map(String::as_str)
    }

    pub fn insert(&mut self, carousel_id: &str, slide_number: u32, data_uri: String) {
        self.by_carousel
            .entry(carousel_id.to_string())
            .or_default()
            .insert(slide_number, data_uri);
    }

    pub fn carousel(&self, carousel_id: &str) -> Option<&BTreeMap<u32, String>> {
        self.by_carousel.get(carousel_id)
    }

    pub fn replace_carousel(&mut self, carousel_id: &str, images: BTreeMap<u32, String>) {
        self.by_carousel.insert(carousel_id.to_string(), images);
    }

    pub fn remove_carousel(&mut self, carousel_id: &str) -> bool {
        self.by_carousel.remove(carousel_id).is_some()
    }

    pub fn count(&self, carousel_id: &str) -> usize {
        self.by_carousel.get(carousel_id).map_or(0, BTreeMap::len)
    }
}

/// Per-slide loading and error flags for the active carousel.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SlideFlags {
    loading: HashMap<u32, bool>,
    error: HashMap<u32, bool>,
}

impl SlideFlags {
    pub fn is_loading(&self, slide_number: u32) -> bool {
        self.loading.get(&slide_number).copied().unwrap_or(false)
    }

    pub fn is_error(&self, slide_number: u32) -> bool {
        self.error.get(&slide_number).copied().unwrap_or(false)
    }

    pub fn start(&mut self, slide_number: u32) {
        self.loading.insert(slide_number, true);
        self.error.insert(slide_number, false);
    }

    pub fn succeed(&mut self, slide_number: u32) {
        self.loading.insert(slide_number, false);
    }

    pub fn fail(&mut self, slide_number: u32) {
        self.loading.insert(slide_number, false);
        self.error.insert(slide_number, true);
    }

    pub fn errored(&self) -> Vec<u32> {
        let mut slides: Vec<u32> = self
            .error
            .iter()
            .filter(|(_, failed)| **failed)
            .map(|(n, _)| *n)
            .collect();
        slides.sort_unstable();
        slides
    }

    pub fn clear(&mut self) {
        self.loading.clear();
        self.error.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_is_partitioned_by_carousel() {
        let mut cache = ImageCache::default();
        cache.insert("a", 1, "data:image/png;base64,AAA".to_string());
        cache.insert("b", 1, "data:image/png;base64,BBB".to_string());
        cache.insert("a", 1, "data:image/png;base64,CCC".to_string());

        assert_eq!(cache.get("a", 1), Some("data:image/png;base64,CCC"));
        assert_eq!(cache.get("b", 1), Some("data:image/png;base64,BBB"));
        assert_eq!(cache.get("a", 2), None);
        assert_eq!(cache.count("a"), 1);
    }

    #[test]
    fn test_flag_transitions() {
        let mut flags = SlideFlags::default();
        flags.start(3);
        assert!(flags.is_loading(3));
        assert!(!flags.is_error(3));

        flags.fail(3);
        assert!(!flags.is_loading(3));
        assert!(flags.is_error(3));
        assert_eq!(flags.errored(), vec![3]);

        // Retry clears the error while loading.
        flags.start(3);
        assert!(!flags.is_error(3));
        flags.succeed(3);
        assert!(flags.errored().is_empty());
    }
}
