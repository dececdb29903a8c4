use std::collections::{HashMap, VecDeque};

/// Exact-text answer cache with least-recently-used eviction.
///
/// Keys are compared verbatim: no case folding, no whitespace trimming.
#[derive(Debug)]
pub struct ResponseCache {
    capacity: usize,
    entries: HashMap<String, String>,
    // Front is the least recently used key.
    order: VecDeque<String>,
}

impl ResponseCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn get(&mut self, question: &str) -> Option<String> {
        let answer = self.entries.get(question)?.clone();
        self.touch(question);
        Some(answer)
    }

    pub fn insert(&mut self, question: String, answer: String) {
        if self.entries.insert(question.clone(), answer).is_some() {
            self.touch(&question);
            return;
        }

        self.order.push_back(question);
        while self.entries.len() > self.capacity {
            let Some(oldest) = self.order.pop_front() else {
                break;
            };
            self.entries.remove(&oldest);
            tracing::trace!(question = %oldest, "evicted cached answer");
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    fn touch(&mut self, question: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == question) {
            if let Some(key) = self.order.remove(pos) {
                self.order.push_back(key);
            }
        }
    }
}
