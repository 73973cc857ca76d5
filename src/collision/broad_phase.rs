//! Broad-phase pair finding on top of the dynamic tree.

use crate::collision::dynamic_tree::DynamicTree;
use crate::collision::raycast::RayCastInput;
use crate::collision::AABB;
use crate::math::Vec2;

/// Tracks moved proxies and reports the new potentially overlapping pairs
/// among them. Pairs are only reported for proxies that were created,
/// moved out of their fat box or touched since the last update.
#[derive(Debug, Clone)]
pub struct BroadPhase<T> {
    tree: DynamicTree<T>,
    move_buffer: Vec<usize>,
}

impl<T: Copy> Default for BroadPhase<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> BroadPhase<T> {
    pub fn new() -> Self {
        Self {
            tree: DynamicTree::new(),
            move_buffer: Vec::with_capacity(16),
        }
    }

    /// Creates a proxy with an initial tight AABB. Pairs are reported at
    /// the next [`update_pairs`](Self::update_pairs).
    pub fn create_proxy(&mut self, aabb: &AABB, user_data: T) -> usize {
        let proxy_id = self.tree.create_proxy(aabb, user_data);
        self.buffer_move(proxy_id);
        proxy_id
    }

    /// Destroys a proxy. Any pairs it is part of are the caller's to remove.
    pub fn destroy_proxy(&mut self, proxy_id: usize) {
        self.unbuffer_move(proxy_id);
        self.tree.destroy_proxy(proxy_id);
    }

    /// Moves a proxy; only a fat-box escape buffers it for pair updates.
    pub fn move_proxy(&mut self, proxy_id: usize, aabb: &AABB, displacement: Vec2) {
        if self.tree.move_proxy(proxy_id, aabb, displacement) {
            self.buffer_move(proxy_id);
        }
    }

    /// Forces the proxy to be re-paired on the next update.
    pub fn touch_proxy(&mut self, proxy_id: usize) {
        self.buffer_move(proxy_id);
    }

    pub fn fat_aabb(&self, proxy_id: usize) -> AABB {
        self.tree.fat_aabb(proxy_id)
    }

    pub fn user_data(&self, proxy_id: usize) -> Option<T> {
        self.tree.user_data(proxy_id)
    }

    /// Whether the fat AABBs of two proxies overlap.
    pub fn test_overlap(&self, proxy_a: usize, proxy_b: usize) -> bool {
        self.tree.fat_aabb(proxy_a).overlaps(&self.tree.fat_aabb(proxy_b))
    }

    pub fn proxy_count(&self) -> usize {
        self.tree.proxy_count()
    }

    pub fn tree_height(&self) -> i32 {
        self.tree.height()
    }

    pub fn tree_balance(&self) -> i32 {
        self.tree.max_balance()
    }

    pub fn tree_quality(&self) -> f64 {
        self.tree.area_ratio()
    }

    fn buffer_move(&mut self, proxy_id: usize) {
        self.move_buffer.push(proxy_id);
    }

    fn unbuffer_move(&mut self, proxy_id: usize) {
        self.move_buffer.retain(|id| *id != proxy_id);
    }

    /// Collects the user data of every new pair whose fat AABBs overlap and
    /// at least one of which moved. Each pair appears once, ordered by
    /// proxy id, and the move buffer is cleared.
    pub fn update_pairs(&mut self) -> Vec<(T, T)> {
        let mut pairs: Vec<(usize, usize)> = Vec::new();

        for &query_proxy in &self.move_buffer {
            let fat_aabb = self.tree.fat_aabb(query_proxy);
            let tree = &self.tree;
            tree.query(&fat_aabb, |proxy_id| {
                // A proxy cannot form a pair with itself.
                if proxy_id == query_proxy {
                    return true;
                }

                // Both proxies are moving: the pair is found from the lower id.
                if tree.was_moved(proxy_id) && proxy_id > query_proxy {
                    return true;
                }

                pairs.push((proxy_id.min(query_proxy), proxy_id.max(query_proxy)));
                true
            });
        }

        pairs.sort_unstable();
        pairs.dedup();

        for proxy_id in self.move_buffer.drain(..) {
            self.tree.clear_moved(proxy_id);
        }

        pairs
            .into_iter()
            .filter_map(|(a, b)| Some((self.tree.user_data(a)?, self.tree.user_data(b)?)))
            .collect()
    }

    /// Reports every proxy whose fat AABB overlaps `aabb`; see [`DynamicTree::query`].
    pub fn query<F: FnMut(usize) -> bool>(&self, aabb: &AABB, callback: F) {
        self.tree.query(aabb, callback);
    }

    /// Ray cast against the fat AABBs; see [`DynamicTree::ray_cast`].
    pub fn ray_cast<F: FnMut(&RayCastInput, usize) -> f64>(&self, input: &RayCastInput, callback: F) {
        self.tree.ray_cast(input, callback);
    }

    pub fn shift_origin(&mut self, new_origin: Vec2) {
        self.tree.shift_origin(new_origin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: f64, y: f64, h: f64) -> AABB {
        AABB::new(Vec2::new(x - h, y - h), Vec2::new(x + h, y + h))
    }

    #[test]
    fn test_new_proxies_pair_once() {
        let mut bp = BroadPhase::new();
        bp.create_proxy(&square(0.0, 0.0, 1.0), 'a');
        bp.create_proxy(&square(1.5, 0.0, 1.0), 'b');
        bp.create_proxy(&square(10.0, 0.0, 1.0), 'c');

        let pairs = bp.update_pairs();
        assert_eq!(pairs, vec![('a', 'b')]);

        // Nothing moved since the last update.
        assert!(bp.update_pairs().is_empty());
    }

    #[test]
    fn test_move_within_fat_box_reports_nothing() {
        let mut bp = BroadPhase::new();
        let a = bp.create_proxy(&square(0.0, 0.0, 1.0), 0u32);
        bp.create_proxy(&square(1.5, 0.0, 1.0), 1u32);
        bp.update_pairs();

        bp.move_proxy(a, &square(0.01, 0.0, 1.0), Vec2::new(0.01, 0.0));
        assert!(bp.update_pairs().is_empty());

        // Touching forces the pair to be reported again.
        bp.touch_proxy(a);
        assert_eq!(bp.update_pairs(), vec![(0, 1)]);
    }

    #[test]
    fn test_moving_into_overlap() {
        let mut bp = BroadPhase::new();
        let a = bp.create_proxy(&square(-5.0, 0.0, 0.5), 0u32);
        bp.create_proxy(&square(5.0, 0.0, 0.5), 1u32);
        assert!(bp.update_pairs().is_empty());
        assert!(!bp.test_overlap(0, 1));

        bp.move_proxy(a, &square(4.5, 0.0, 0.5), Vec2::new(9.5, 0.0));
        assert_eq!(bp.update_pairs(), vec![(0, 1)]);
        assert!(bp.test_overlap(0, 1));
    }

    #[test]
    fn test_destroyed_proxy_is_unbuffered() {
        let mut bp = BroadPhase::new();
        let a = bp.create_proxy(&square(0.0, 0.0, 1.0), 0u32);
        bp.create_proxy(&square(0.5, 0.0, 1.0), 1u32);
        bp.destroy_proxy(a);
        assert!(bp.update_pairs().is_empty());
        assert_eq!(bp.proxy_count(), 1);
    }

    #[test]
    fn test_query_and_ray_cast() {
        let mut bp = BroadPhase::new();
        for i in 0..4 {
            bp.create_proxy(&square(i as f64 * 4.0, 0.0, 1.0), i);
        }
        let mut found = Vec::new();
        bp.query(&square(4.0, 0.0, 0.1), |id| {
            found.push(bp.user_data(id));
            true
        });
        assert_eq!(found, vec![Some(1)]);

        let input = RayCastInput::new(Vec2::new(-5.0, 0.0), Vec2::new(20.0, 0.0));
        let mut hits = 0;
        bp.ray_cast(&input, |sub, _| {
            hits += 1;
            sub.max_fraction
        });
        assert_eq!(hits, 4);
        assert!(bp.tree_height() >= 2);
        assert!(bp.tree_quality() >= 1.0);
        assert!(bp.tree_balance() <= bp.tree_height());
    }
}
