//! Filtered project listings.
//!
//! A [`ProjectListing`] borrows the project collection and yields matches
//! lazily. Iterating it again starts over from the first match.

use crate::model::project::Project;

/// Result ordering for project listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest `created_at` first; equal timestamps keep collection order.
    #[default]
    Latest,
    /// Collection order.
    Unspecified,
}

/// Search/filter input for project listings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectQuery {
    /// Case-insensitive title substring; blank matches everything.
    pub search: Option<String>,
    /// Required tags; a project must carry all of them.
    pub tags: Vec<String>,
    pub sort: SortOrder,
}

impl ProjectQuery {
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }
}

/// Restartable view over the projects matching a [`ProjectQuery`].
#[derive(Debug, Clone)]
pub struct ProjectListing<'a> {
    projects: &'a [Project],
    order: Vec<usize>,
    needle: Option<String>,
    tags: Vec<String>,
}

impl<'a> ProjectListing<'a> {
    pub(crate) fn new(projects: &'a [Project], query: &ProjectQuery) -> Self {
        let mut order: Vec<usize> = (0..projects.len()).collect();
        if query.sort == SortOrder::Latest {
            // Stable sort keeps collection order for equal timestamps.
            order.sort_by(|&a, &b| projects[b].created_at.cmp(&projects[a].created_at));
        }
        let needle = query
            .search
            .as_deref()
            .map(str::to_lowercase)
            .filter(|term| !term.is_empty());

        Self {
            projects,
            order,
            needle,
            tags: query.tags.clone(),
        }
    }

    /// Fresh iterator starting from the first match.
    pub fn iter(&self) -> ListingIter<'_, 'a> {
        ListingIter {
            listing: self,
            cursor: 0,
        }
    }

    /// Number of matches; walks the whole listing.
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Collects matches into an owned vector.
    pub fn to_vec(&self) -> Vec<Project> {
        self.iter().cloned().collect()
    }

    fn matches(&self, project: &Project) -> bool {
        if let Some(needle) = &self.needle {
            if !project.title.to_lowercase().contains(needle.as_str()) {
                return false;
            }
        }
        project.has_all_tags(&self.tags)
    }
}

/// Lazy iterator over a [`ProjectListing`].
pub struct ListingIter<'l, 'a> {
    listing: &'l ProjectListing<'a>,
    cursor: usize,
}

impl<'a> Iterator for ListingIter<'_, 'a> {
    type Item = &'a Project;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&index) = self.listing.order.get(self.cursor) {
            self.cursor += 1;
            let project = &self.listing.projects[index];
            if self.listing.matches(project) {
                return Some(project);
            }
        }
        None
    }
}

impl<'l, 'a> IntoIterator for &'l ProjectListing<'a> {
    type Item = &'a Project;
    type IntoIter = ListingIter<'l, 'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::{ProjectListing, ProjectQuery, SortOrder};
    use crate::model::project::{Project, ProjectStatus};
    use uuid::Uuid;

    fn project(title: &str, tags: &[&str], created_at: i64) -> Project {
        Project {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: "d".to_string(),
            status: ProjectStatus::Planning,
            image_url: None,
            tags: tags.iter().map(|tag| tag.to_string()).collect(),
            owner_id: Uuid::nil(),
            created_at,
        }
    }

    fn titles(listing: &ProjectListing<'_>) -> Vec<String> {
        listing.iter().map(|project| project.title.clone()).collect()
    }

    #[test]
    fn latest_sorts_descending_and_keeps_ties_stable() {
        let projects = vec![
            project("old", &[], 1),
            project("tie-a", &[], 5),
            project("tie-b", &[], 5),
            project("new", &[], 9),
        ];
        let listing = ProjectListing::new(&projects, &ProjectQuery::default());
        assert_eq!(titles(&listing), vec!["new", "tie-a", "tie-b", "old"]);
    }

    #[test]
    fn unspecified_keeps_collection_order() {
        let projects = vec![project("b", &[], 9), project("a", &[], 1)];
        let query = ProjectQuery::default().sort(SortOrder::Unspecified);
        let listing = ProjectListing::new(&projects, &query);
        assert_eq!(titles(&listing), vec!["b", "a"]);
    }

    #[test]
    fn search_is_case_insensitive_substring_and_tags_are_superset() {
        let projects = vec![
            project("Rust Parser", &["rust", "cli"], 1),
            project("rusty web", &["web"], 2),
            project("Go tool", &["cli"], 3),
        ];

        let listing = ProjectListing::new(&projects, &ProjectQuery::default().search("RUST"));
        assert_eq!(titles(&listing), vec!["rusty web", "Rust Parser"]);

        let listing = ProjectListing::new(&projects, &ProjectQuery::default().tag("cli"));
        assert_eq!(titles(&listing), vec!["Go tool", "Rust Parser"]);

        let query = ProjectQuery::default().search("rust").tag("cli").tag("rust");
        let listing = ProjectListing::new(&projects, &query);
        assert_eq!(titles(&listing), vec!["Rust Parser"]);
    }

    #[test]
    fn listing_restarts_on_each_iteration() {
        let projects = vec![project("a", &[], 1), project("b", &[], 2)];
        let listing = ProjectListing::new(&projects, &ProjectQuery::default());

        let mut first = listing.iter();
        assert_eq!(first.next().map(|p| p.title.as_str()), Some("b"));

        let again: Vec<_> = (&listing).into_iter().map(|p| p.title.as_str()).collect();
        assert_eq!(again, vec!["b", "a"]);
        assert_eq!(listing.count(), 2);
    }

    #[test]
    fn empty_search_matches_everything() {
        let projects = vec![project("a", &[], 1)];
        let listing = ProjectListing::new(&projects, &ProjectQuery::default().search(""));
        assert!(!listing.is_empty());

        let listing = ProjectListing::new(&projects, &ProjectQuery::default().search("zzz"));
        assert!(listing.is_empty());
    }

    #[test]
    fn search_whitespace_is_part_of_the_term() {
        let projects = vec![project("ax", &[], 1), project("a x", &[], 2)];

        let listing = ProjectListing::new(&projects, &ProjectQuery::default().search(" x"));
        assert_eq!(titles(&listing), vec!["a x"]);

        let listing = ProjectListing::new(&projects, &ProjectQuery::default().search("  "));
        assert!(listing.is_empty());
    }
}
