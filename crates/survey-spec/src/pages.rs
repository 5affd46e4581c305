use crate::response::ResponseContext;
use crate::spec::item::{SingleItem, SurveyItem};
use crate::spec::survey::Survey;
use crate::visibility::condition_holds;

/// Non-empty run of visible leaf items shown together.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<'a> {
    pub index: usize,
    pub items: Vec<&'a SingleItem>,
}

impl Page<'_> {
    pub fn keys(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.key.as_str()).collect()
    }
}

/// Partitions the survey into pages for the current responses and context.
///
/// Items are emitted depth first in declaration order. Page breaks close the
/// current page; hidden items and hidden groups (including any page breaks
/// inside them) are skipped; pages left without items are dropped, so the
/// page count depends on the context.
pub fn survey_pages<'a>(survey: &'a Survey, ctx: &ResponseContext) -> Vec<Page<'a>> {
    let mut partitioner = Partitioner::default();
    if condition_holds(survey.root.condition.as_ref(), ctx) {
        partitioner.walk(&survey.root.items, ctx);
    }
    partitioner.finish()
}

#[derive(Default)]
struct Partitioner<'a> {
    pages: Vec<Page<'a>>,
    current: Vec<&'a SingleItem>,
}

impl<'a> Partitioner<'a> {
    fn walk(&mut self, items: &'a [SurveyItem], ctx: &ResponseContext) {
        for item in items {
            match item {
                SurveyItem::PageBreak { .. } => self.close_page(),
                SurveyItem::Group(group) => {
                    if condition_holds(group.condition.as_ref(), ctx) {
                        self.walk(&group.items, ctx);
                    }
                }
                SurveyItem::Single(single) => {
                    if condition_holds(single.condition.as_ref(), ctx) {
                        self.current.push(single);
                    }
                }
            }
        }
    }

    fn close_page(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let items = std::mem::take(&mut self.current);
        self.pages.push(Page {
            index: self.pages.len(),
            items,
        });
    }

    fn finish(mut self) -> Vec<Page<'a>> {
        self.close_page();
        self.pages
    }
}
