use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One photo placed in one frame. `frame_index` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub frame_index: usize,
    pub photo_id: String,
}

/// One sheet of the photobook.
///
/// `assignments` is kept sorted by frame index. A page may hold fewer
/// assignments than its layout has frames; the missing frames render empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    pub page_number: usize,
    pub layout_name: String,
    pub assignments: Vec<Assignment>,
}

impl Page {
    pub fn new(
        id: impl Into<String>,
        page_number: usize,
        layout_name: impl Into<String>,
        mut assignments: Vec<Assignment>,
    ) -> Self {
        assignments.sort_by_key(|a| a.frame_index);
        Self {
            id: id.into(),
            page_number,
            layout_name: layout_name.into(),
            assignments,
        }
    }

    /// Photo ids in frame order.
    pub fn photo_ids(&self) -> Vec<String> {
        self.assignments.iter().map(|a| a.photo_id.clone()).collect()
    }

    pub fn photo_at(&self, frame_index: usize) -> Option<&str> {
        self.assignments
            .iter()
            .find(|a| a.frame_index == frame_index)
            .map(|a| a.photo_id.as_str())
    }

    /// Replaces the occupant of `frame_index`. `None` empties the frame.
    pub fn set_photo(&mut self, frame_index: usize, photo_id: Option<String>) {
        self.assignments.retain(|a| a.frame_index != frame_index);
        if let Some(photo_id) = photo_id {
            self.assignments.push(Assignment {
                frame_index,
                photo_id,
            });
            self.assignments.sort_by_key(|a| a.frame_index);
        }
    }
}

/// A page id that cannot collide with the `page-{n}` ids of a fresh composition.
pub fn fresh_page_id() -> String {
    format!("page-{}", Uuid::new_v4())
}

/// Rewrites `page_number` so that `pages[k].page_number == k + 1`.
pub fn renumber(pages: &mut [Page]) {
    for (index, page) in pages.iter_mut().enumerate() {
        page.page_number = index + 1;
    }
}
