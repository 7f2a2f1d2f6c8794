use std::collections::{HashMap, VecDeque};

/// Recent center positions per track, each capped to a fixed length.
#[derive(Debug, Clone)]
pub struct TrackHistory {
    capacity: usize,
    tracks: HashMap<u64, VecDeque<(f32, f32)>>,
}

impl TrackHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            tracks: HashMap::new(),
        }
    }

    /// Append a position, evicting the oldest one once the track is full.
    pub fn push(&mut self, track_id: u64, point: (f32, f32)) {
        if self.capacity == 0 {
            return;
        }
        let capacity = self.capacity;
        let track = self
            .tracks
            .entry(track_id)
            .or_insert_with(|| VecDeque::with_capacity(capacity));
        if track.len() == capacity {
            track.pop_front();
        }
        track.push_back(point);
    }

    /// Positions for `track_id`, oldest first.
    pub fn get(&self, track_id: u64) -> Option<&VecDeque<(f32, f32)>> {
        self.tracks.get(&track_id)
    }

    /// Number of tracks with a history.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn clear(&mut self) {
        self.tracks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_cap() {
        let mut history = TrackHistory::new(3);
        for i in 0..5 {
            history.push(9, (i as f32, 0.0));
        }
        let points: Vec<f32> = history.get(9).unwrap().iter().map(|p| p.0).collect();
        assert_eq!(points, vec![2.0, 3.0, 4.0]);
        assert_eq!(history.len(), 1);
    }
}
