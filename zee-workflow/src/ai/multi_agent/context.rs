use super::types::ContextItem;

/// Which slice of the context log an agent gets to see
#[derive(Debug, Clone, PartialEq)]
pub enum ContextView<'a> {
    /// Everything, including the goal
    Full,
    /// Everything except `user` entries
    WithoutUser,
    /// `user` entries plus entries written by the named agents
    Roles(Vec<&'a str>),
}

/// Append-only log of every completed exchange. The first entry is always the goal.
#[derive(Debug, Clone)]
pub struct ContextStore {
    items: Vec<ContextItem>,
}

impl ContextStore {
    pub fn new(goal: impl Into<String>) -> Self {
        ContextStore {
            items: vec![ContextItem::user(goal)],
        }
    }

    pub fn push(&mut self, item: ContextItem) {
        self.items.push(item);
    }

    pub fn goal(&self) -> &str {
        &self.items[0].content
    }

    pub fn items(&self) -> &[ContextItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn errors(&self) -> impl Iterator<Item = &ContextItem> {
        self.items.iter().filter(|item| item.is_error())
    }

    /// `role: content` lines joined by newlines; `None` when the view is empty
    pub fn render(&self, view: &ContextView<'_>) -> Option<String> {
        let lines: Vec<String> = self
            .items
            .iter()
            .filter(|item| match view {
                ContextView::Full => true,
                ContextView::WithoutUser => !item.is_user(),
                ContextView::Roles(roles) => {
                    item.is_user() || roles.iter().any(|role| *role == item.role)
                }
            })
            .map(ContextItem::render)
            .collect();

        if lines.is_empty() {
            None
        } else {
            Some(lines.join("\n"))
        }
    }

    /// JSON array of `{role, content}`, as handed to the endgame agent
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.items).unwrap_or_else(|_| "[]".to_string())
    }

    pub fn into_items(self) -> Vec<ContextItem> {
        self.items
    }
}
