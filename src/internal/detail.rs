//! Article detail screen state.

use crate::api::ApiError;
use crate::internal::models::ArticleDetail;

#[derive(Debug, Clone, PartialEq)]
pub enum DetailState {
    Loading,
    Loaded(Box<ArticleDetail>),
    NotFound,
    Failed(String),
}

/// Detail view for one article id. Results for any other id are ignored,
/// so a slow response cannot overwrite the article the user opened last.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailView {
    pub article_id: u32,
    pub state: DetailState,
    pub scroll: u16,
}

impl DetailView {
    pub fn open(article_id: u32) -> Self {
        Self {
            article_id,
            state: DetailState::Loading,
            scroll: 0,
        }
    }

    /// Returns false when the result belongs to another article.
    pub fn apply(&mut self, article_id: u32, result: Result<ArticleDetail, ApiError>) -> bool {
        if article_id != self.article_id {
            tracing::debug!(
                article_id,
                showing = self.article_id,
                "ignoring detail for another article"
            );
            return false;
        }

        self.state = match result {
            Ok(detail) => DetailState::Loaded(Box::new(detail)),
            Err(ApiError::NotFound(_)) => DetailState::NotFound,
            Err(err) => {
                tracing::error!(article_id, error = %err, "failed to load article");
                DetailState::Failed(err.to_string())
            }
        };
        true
    }

    pub fn article(&self) -> Option<&ArticleDetail> {
        match &self.state {
            DetailState::Loaded(detail) => Some(detail),
            _ => None,
        }
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::models::ArticleSummary;

    fn detail(id: u32) -> ArticleDetail {
        ArticleDetail {
            summary: ArticleSummary {
                id,
                title: format!("article {}", id),
                ..Default::default()
            },
            content: Some("본문".to_string()),
            author: None,
        }
    }

    #[test]
    fn loads_requested_article() {
        let mut view = DetailView::open(7);
        assert_eq!(view.state, DetailState::Loading);
        assert!(view.apply(7, Ok(detail(7))));
        assert_eq!(view.article().map(|a| a.summary.id), Some(7));
    }

    #[test]
    fn ignores_other_ids() {
        let mut view = DetailView::open(7);
        assert!(!view.apply(3, Ok(detail(3))));
        assert_eq!(view.state, DetailState::Loading);
    }

    #[test]
    fn not_found_is_distinct_from_failure() {
        let mut view = DetailView::open(404);
        view.apply(404, Err(ApiError::NotFound(404)));
        assert_eq!(view.state, DetailState::NotFound);

        let mut view = DetailView::open(5);
        view.apply(
            5,
            Err(ApiError::Transport {
                context: "get_article".to_string(),
                reason: "timed out".to_string(),
            }),
        );
        assert!(matches!(view.state, DetailState::Failed(ref msg) if msg.contains("timed out")));
    }

    #[test]
    fn scroll_saturates_at_top() {
        let mut view = DetailView::open(1);
        view.scroll_up();
        assert_eq!(view.scroll, 0);
        view.scroll_down();
        view.scroll_down();
        assert_eq!(view.scroll, 2);
    }
}
