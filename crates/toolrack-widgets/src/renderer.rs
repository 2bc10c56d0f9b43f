//! View registry: maps resolved view contexts to renderers.
//!
//! Registration happens once at startup and duplicate contexts are rejected
//! outright. Lookups resolve the requested context against the caller's
//! User-Agent first, then fall back to a generic card view which is cached
//! under the resolved context so repeated misses stay cheap.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::views::{CardView, ViewContext, ViewRequest, WidgetView};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ViewRegistryError {
    #[error("view already registered for context '{0}'")]
    Duplicate(&'static str),
}

pub struct ViewRegistry {
    views: Mutex<HashMap<ViewContext, Arc<dyn WidgetView>>>,
}

impl Default for ViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self {
            views: Mutex::new(HashMap::new()),
        }
    }

    /// Registry preloaded with the stock list/detail/mobile/desktop views.
    pub fn with_builtin_views() -> Self {
        use crate::views::{DetailView, ListView, MobileCardView};
        let registry = Self::new();
        for view in [
            Arc::new(ListView::desktop()) as Arc<dyn WidgetView>,
            Arc::new(ListView::mobile()),
            Arc::new(DetailView::desktop()),
            Arc::new(DetailView::mobile()),
            Arc::new(MobileCardView),
            Arc::new(CardView::new(ViewContext::Desktop)),
            Arc::new(CardView::new(ViewContext::Default)),
        ] {
            // Fresh registry, fixed contexts: duplicates are impossible here.
            registry.register(view).expect("builtin view registration");
        }
        registry
    }

    pub fn register(&self, view: Arc<dyn WidgetView>) -> Result<(), ViewRegistryError> {
        let context = view.context();
        let mut views = self.views.lock().expect("view registry poisoned");
        if views.contains_key(&context) {
            return Err(ViewRegistryError::Duplicate(context.as_str()));
        }
        tracing::debug!(context = context.as_str(), "view registered");
        views.insert(context, view);
        Ok(())
    }

    /// Resolve `context` against the user agent and return the renderer for
    /// it, installing a fallback card view on a miss.
    pub fn get(&self, context: ViewContext, user_agent: Option<&str>) -> Arc<dyn WidgetView> {
        let resolved = context.resolve(user_agent);
        let mut views = self.views.lock().expect("view registry poisoned");
        if let Some(view) = views.get(&resolved) {
            return Arc::clone(view);
        }
        tracing::debug!(
            context = resolved.as_str(),
            "no view registered, using fallback card view"
        );
        let fallback: Arc<dyn WidgetView> = Arc::new(CardView::new(resolved));
        views.insert(resolved, Arc::clone(&fallback));
        fallback
    }

    pub fn render(&self, request: &ViewRequest, user_agent: Option<&str>) -> String {
        self.get(request.context, user_agent).render(request)
    }

    /// Render a batch. Requests sharing one resolved context go through that
    /// view's `render_many` so list wrappers apply; mixed batches are grouped
    /// per view while preserving encounter order of the groups.
    pub fn render_many(&self, requests: &[ViewRequest], user_agent: Option<&str>) -> String {
        if requests.is_empty() {
            return String::new();
        }
        let mut groups: Vec<(ViewContext, Vec<ViewRequest>)> = Vec::new();
        for request in requests {
            let resolved = request.context.resolve(user_agent);
            match groups.iter_mut().find(|(ctx, _)| *ctx == resolved) {
                Some((_, members)) => members.push(request.clone()),
                None => groups.push((resolved, vec![request.clone()])),
            }
        }
        groups
            .into_iter()
            .map(|(context, members)| self.get(context, user_agent).render_many(&members))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
