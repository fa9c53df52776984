//! Two-tier task queue for deferred replication.
//!
//! Slides and cheap components go to the high tier, expensive components
//! (charts, large tables, videos) to the low tier. Both tiers are FIFO and
//! the high tier always drains first, so a slide is created before any of its
//! components and cheap content appears before heavy content.

use std::collections::VecDeque;

use deckhand_common::{Component, ComponentType, ReplicationConfig, SlideSnapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPriority {
    High,
    Low,
}

/// One unit of replication work, applied in its own transaction
#[derive(Debug, Clone, PartialEq)]
pub enum ReplicationTask {
    /// Slide without its components
    CreateSlide(SlideSnapshot),
    AppendComponent {
        slide_id: String,
        component: Component,
    },
}

impl ReplicationTask {
    pub fn priority(&self, config: &ReplicationConfig) -> TaskPriority {
        match self {
            ReplicationTask::CreateSlide(_) => TaskPriority::High,
            ReplicationTask::AppendComponent { component, .. } => priority_for(component, config),
        }
    }
}

/// Estimated replication cost of a component
pub fn priority_for(component: &Component, config: &ReplicationConfig) -> TaskPriority {
    let heavy = component.is_chart()
        || component.kind == ComponentType::Video
        || (component.kind == ComponentType::Table
            && component.table_row_count() > config.heavy_table_rows);

    if heavy {
        TaskPriority::Low
    } else {
        TaskPriority::High
    }
}

#[derive(Debug, Default)]
pub struct TaskQueue {
    high: VecDeque<ReplicationTask>,
    low: VecDeque<ReplicationTask>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue every slide, then its components, in snapshot order
    pub fn from_slides(slides: Vec<SlideSnapshot>, config: &ReplicationConfig) -> Self {
        let mut queue = Self::new();
        for mut slide in slides {
            let components = std::mem::take(&mut slide.components);
            let slide_id = slide.id.clone();
            queue.push(ReplicationTask::CreateSlide(slide), config);
            for component in components {
                queue.push(
                    ReplicationTask::AppendComponent {
                        slide_id: slide_id.clone(),
                        component,
                    },
                    config,
                );
            }
        }
        queue
    }

    pub fn push(&mut self, task: ReplicationTask, config: &ReplicationConfig) {
        match task.priority(config) {
            TaskPriority::High => self.high.push_back(task),
            TaskPriority::Low => self.low.push_back(task),
        }
    }

    pub fn pop(&mut self) -> Option<ReplicationTask> {
        self.high.pop_front().or_else(|| self.low.pop_front())
    }

    /// Up to `size` tasks, high tier first
    pub fn next_batch(&mut self, size: usize) -> Vec<ReplicationTask> {
        std::iter::from_fn(|| self.pop()).take(size.max(1)).collect()
    }

    pub fn len(&self) -> usize {
        self.high.len() + self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.high.is_empty() && self.low.is_empty()
    }

    pub fn len_of(&self, priority: TaskPriority) -> usize {
        match priority {
            TaskPriority::High => self.high.len(),
            TaskPriority::Low => self.low.len(),
        }
    }
}
