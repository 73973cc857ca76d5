//! Dynamic AABB tree.
//!
//! Leaves hold fat AABBs: the tight box extended by a margin so small
//! motions do not touch the tree. Inserts pick the sibling with the least
//! perimeter cost and the tree is kept balanced with AVL-style rotations.

use crate::collision::raycast::RayCastInput;
use crate::collision::AABB;
use crate::common::settings::{AABB_EXTENSION, AABB_MULTIPLIER};
use crate::math::Vec2;

/// Null node sentinel.
pub const NULL_NODE: usize = usize::MAX;

#[derive(Debug, Clone)]
struct TreeNode<T> {
    /// Fat AABB.
    aabb: AABB,
    /// Leaf payload.
    user_data: Option<T>,
    /// Parent for live nodes, next free node for pooled ones.
    parent: usize,
    child1: usize,
    child2: usize,
    /// Leaf = 0, free node = -1.
    height: i32,
    /// Set when the proxy moved enough to need new pairs.
    moved: bool,
}

impl<T> TreeNode<T> {
    fn is_leaf(&self) -> bool {
        self.child1 == NULL_NODE
    }
}

/// Bounding volume hierarchy of proxies carrying `T`.
#[derive(Debug, Clone)]
pub struct DynamicTree<T> {
    root: usize,
    nodes: Vec<TreeNode<T>>,
    free_list: usize,
    proxy_count: usize,
}

impl<T: Copy> Default for DynamicTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> DynamicTree<T> {
    pub fn new() -> Self {
        Self {
            root: NULL_NODE,
            nodes: Vec::with_capacity(16),
            free_list: NULL_NODE,
            proxy_count: 0,
        }
    }

    fn allocate_node(&mut self) -> usize {
        if self.free_list == NULL_NODE {
            self.nodes.push(TreeNode {
                aabb: AABB::default(),
                user_data: None,
                parent: NULL_NODE,
                child1: NULL_NODE,
                child2: NULL_NODE,
                height: 0,
                moved: false,
            });
            return self.nodes.len() - 1;
        }

        let id = self.free_list;
        let node = &mut self.nodes[id];
        self.free_list = node.parent;
        node.parent = NULL_NODE;
        node.child1 = NULL_NODE;
        node.child2 = NULL_NODE;
        node.height = 0;
        node.user_data = None;
        node.moved = false;
        id
    }

    fn free_node(&mut self, id: usize) {
        let node = &mut self.nodes[id];
        node.parent = self.free_list;
        node.height = -1;
        node.user_data = None;
        self.free_list = id;
    }

    /// Creates a proxy for `aabb` and returns its id. The stored box is
    /// fattened by `AABB_EXTENSION`.
    pub fn create_proxy(&mut self, aabb: &AABB, user_data: T) -> usize {
        let id = self.allocate_node();
        let node = &mut self.nodes[id];
        node.aabb = aabb.expanded(AABB_EXTENSION);
        node.user_data = Some(user_data);
        node.height = 0;
        node.moved = true;

        self.insert_leaf(id);
        self.proxy_count += 1;
        id
    }

    pub fn destroy_proxy(&mut self, proxy_id: usize) {
        debug_assert!(self.nodes[proxy_id].is_leaf());
        self.remove_leaf(proxy_id);
        self.free_node(proxy_id);
        self.proxy_count -= 1;
    }

    /// Updates a proxy for its new tight `aabb`. The leaf is only
    /// reinserted when `aabb` escapes the fat box, or the fat box has grown
    /// far larger than needed. The new fat box is extended along
    /// `displacement` to anticipate motion. Returns true if reinserted.
    pub fn move_proxy(&mut self, proxy_id: usize, aabb: &AABB, displacement: Vec2) -> bool {
        debug_assert!(self.nodes[proxy_id].is_leaf());

        let mut fat_aabb = aabb.expanded(AABB_EXTENSION);

        // Stretch along the displacement.
        let d = displacement * AABB_MULTIPLIER;
        if d.x < 0.0 {
            fat_aabb.min.x += d.x;
        } else {
            fat_aabb.max.x += d.x;
        }
        if d.y < 0.0 {
            fat_aabb.min.y += d.y;
        } else {
            fat_aabb.max.y += d.y;
        }

        let tree_aabb = self.nodes[proxy_id].aabb;
        if tree_aabb.contains(aabb) {
            // The tree AABB still contains the object, but it might be too large.
            let huge_aabb = fat_aabb.expanded(4.0 * AABB_EXTENSION);
            if huge_aabb.contains(&tree_aabb) {
                return false;
            }
        }

        self.remove_leaf(proxy_id);
        self.nodes[proxy_id].aabb = fat_aabb;
        self.insert_leaf(proxy_id);
        self.nodes[proxy_id].moved = true;
        true
    }

    pub fn user_data(&self, proxy_id: usize) -> Option<T> {
        self.nodes.get(proxy_id).and_then(|n| n.user_data)
    }

    pub fn was_moved(&self, proxy_id: usize) -> bool {
        self.nodes[proxy_id].moved
    }

    pub fn clear_moved(&mut self, proxy_id: usize) {
        self.nodes[proxy_id].moved = false;
    }

    pub fn fat_aabb(&self, proxy_id: usize) -> AABB {
        self.nodes[proxy_id].aabb
    }

    pub fn proxy_count(&self) -> usize {
        self.proxy_count
    }

    /// Visits every proxy whose fat AABB overlaps `aabb`. The callback
    /// returns false to stop the query.
    pub fn query<F: FnMut(usize) -> bool>(&self, aabb: &AABB, mut callback: F) {
        if self.root == NULL_NODE {
            return;
        }

        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id];
            if !node.aabb.overlaps(aabb) {
                continue;
            }

            if node.is_leaf() {
                if !callback(node_id) {
                    return;
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    /// Casts a ray against the proxies' fat AABBs. The callback receives the
    /// clipped input and a proxy id, and returns the new max fraction:
    /// 0 terminates, the input's max fraction leaves it unchanged and a
    /// value in between clips the ray. A negative value ignores the proxy.
    pub fn ray_cast<F: FnMut(&RayCastInput, usize) -> f64>(&self, input: &RayCastInput, mut callback: F) {
        if self.root == NULL_NODE {
            return;
        }

        let p1 = input.p1;
        let p2 = input.p2;

        // A zero-length ray hits nothing.
        if (p2 - p1).magnitude_squared() < f64::EPSILON * f64::EPSILON {
            return;
        }
        let r = (p2 - p1).normalize();

        // v is perpendicular to the segment.
        let v = Vec2::scalar_cross(1.0, r);
        let abs_v = v.abs();

        let mut max_fraction = input.max_fraction;

        // Build a bounding box for the segment.
        let segment_aabb = |fraction: f64| {
            let t = p1 + (p2 - p1) * fraction;
            AABB::new(p1.min(t), p1.max(t))
        };
        let mut segment = segment_aabb(max_fraction);

        let mut stack = Vec::with_capacity(64);
        stack.push(self.root);

        while let Some(node_id) = stack.pop() {
            let node = &self.nodes[node_id];
            if !node.aabb.overlaps(&segment) {
                continue;
            }

            // Separating axis for segment (Gino, p80).
            // |dot(v, p1 - c)| > dot(|v|, h)
            let c = node.aabb.center();
            let h = node.aabb.extents();
            let separation = v.dot(p1 - c).abs() - abs_v.dot(h);
            if separation > 0.0 {
                continue;
            }

            if node.is_leaf() {
                let sub_input = RayCastInput {
                    p1,
                    p2,
                    max_fraction,
                };
                let value = callback(&sub_input, node_id);

                if value == 0.0 {
                    return;
                }

                if value > 0.0 {
                    max_fraction = value;
                    segment = segment_aabb(max_fraction);
                }
            } else {
                stack.push(node.child1);
                stack.push(node.child2);
            }
        }
    }

    fn insert_leaf(&mut self, leaf: usize) {
        if self.root == NULL_NODE {
            self.root = leaf;
            self.nodes[leaf].parent = NULL_NODE;
            return;
        }

        // Surface area heuristic descent.
        let leaf_aabb = self.nodes[leaf].aabb;
        let mut index = self.root;
        while !self.nodes[index].is_leaf() {
            let node = &self.nodes[index];
            let child1 = node.child1;
            let child2 = node.child2;

            let area = node.aabb.perimeter();
            let combined_area = AABB::combine(&node.aabb, &leaf_aabb).perimeter();

            // Cost of creating a new parent for this node and the new leaf.
            let cost = 2.0 * combined_area;

            // Minimum cost of pushing the leaf further down the tree.
            let inheritance_cost = 2.0 * (combined_area - area);

            let child_cost = |child: usize| {
                let c = &self.nodes[child];
                let combined = AABB::combine(&leaf_aabb, &c.aabb).perimeter();
                if c.is_leaf() {
                    combined + inheritance_cost
                } else {
                    combined - c.aabb.perimeter() + inheritance_cost
                }
            };
            let cost1 = child_cost(child1);
            let cost2 = child_cost(child2);

            if cost < cost1 && cost < cost2 {
                break;
            }

            index = if cost1 < cost2 { child1 } else { child2 };
        }

        let sibling = index;

        let old_parent = self.nodes[sibling].parent;
        let new_parent = self.allocate_node();
        {
            let sibling_aabb = self.nodes[sibling].aabb;
            let sibling_height = self.nodes[sibling].height;
            let node = &mut self.nodes[new_parent];
            node.parent = old_parent;
            node.user_data = None;
            node.aabb = AABB::combine(&leaf_aabb, &sibling_aabb);
            node.height = sibling_height + 1;
            node.child1 = sibling;
            node.child2 = leaf;
        }
        self.nodes[sibling].parent = new_parent;
        self.nodes[leaf].parent = new_parent;

        if old_parent != NULL_NODE {
            if self.nodes[old_parent].child1 == sibling {
                self.nodes[old_parent].child1 = new_parent;
            } else {
                self.nodes[old_parent].child2 = new_parent;
            }
        } else {
            // The sibling was the root.
            self.root = new_parent;
        }

        self.refit_from(self.nodes[leaf].parent);
    }

    fn remove_leaf(&mut self, leaf: usize) {
        if leaf == self.root {
            self.root = NULL_NODE;
            return;
        }

        let parent = self.nodes[leaf].parent;
        let grand_parent = self.nodes[parent].parent;
        let sibling = if self.nodes[parent].child1 == leaf {
            self.nodes[parent].child2
        } else {
            self.nodes[parent].child1
        };

        if grand_parent != NULL_NODE {
            // The sibling takes the parent's place.
            if self.nodes[grand_parent].child1 == parent {
                self.nodes[grand_parent].child1 = sibling;
            } else {
                self.nodes[grand_parent].child2 = sibling;
            }
            self.nodes[sibling].parent = grand_parent;
            self.free_node(parent);

            self.refit_from(grand_parent);
        } else {
            self.root = sibling;
            self.nodes[sibling].parent = NULL_NODE;
            self.free_node(parent);
        }
    }

    fn refit_from(&mut self, start: usize) {
        let mut index = start;
        while index != NULL_NODE {
            index = self.balance(index);

            let child1 = self.nodes[index].child1;
            let child2 = self.nodes[index].child2;
            debug_assert!(child1 != NULL_NODE && child2 != NULL_NODE);

            let height = 1 + self.nodes[child1].height.max(self.nodes[child2].height);
            let aabb = AABB::combine(&self.nodes[child1].aabb, &self.nodes[child2].aabb);
            let node = &mut self.nodes[index];
            node.height = height;
            node.aabb = aabb;

            index = node.parent;
        }
    }

    /// Performs a left or right rotation if node `i_a` is imbalanced.
    /// Returns the new root index of the subtree.
    fn balance(&mut self, i_a: usize) -> usize {
        debug_assert!(i_a != NULL_NODE);

        if self.nodes[i_a].is_leaf() || self.nodes[i_a].height < 2 {
            return i_a;
        }

        let i_b = self.nodes[i_a].child1;
        let i_c = self.nodes[i_a].child2;

        let balance = self.nodes[i_c].height - self.nodes[i_b].height;

        if balance > 1 {
            // Rotate C up.
            self.rotate_up(i_a, i_c, i_b, false)
        } else if balance < -1 {
            // Rotate B up.
            self.rotate_up(i_a, i_b, i_c, true)
        } else {
            i_a
        }
    }

    /// Lifts `i_up` (a child of `i_a`) above it. `i_other` is the remaining
    /// child of `i_a`; `up_was_child1` tells which slot `i_up` occupied.
    fn rotate_up(&mut self, i_a: usize, i_up: usize, i_other: usize, up_was_child1: bool) -> usize {
        let i_f = self.nodes[i_up].child1;
        let i_g = self.nodes[i_up].child2;

        // Swap A and the lifted node.
        self.nodes[i_up].child1 = i_a;
        self.nodes[i_up].parent = self.nodes[i_a].parent;
        self.nodes[i_a].parent = i_up;

        // A's old parent should point to the lifted node.
        let up_parent = self.nodes[i_up].parent;
        if up_parent != NULL_NODE {
            if self.nodes[up_parent].child1 == i_a {
                self.nodes[up_parent].child1 = i_up;
            } else {
                debug_assert!(self.nodes[up_parent].child2 == i_a);
                self.nodes[up_parent].child2 = i_up;
            }
        } else {
            self.root = i_up;
        }

        // Keep the taller grandchild under the lifted node.
        let (keep, give) = if self.nodes[i_f].height > self.nodes[i_g].height {
            (i_f, i_g)
        } else {
            (i_g, i_f)
        };

        self.nodes[i_up].child2 = keep;
        if up_was_child1 {
            self.nodes[i_a].child1 = give;
        } else {
            self.nodes[i_a].child2 = give;
        }
        self.nodes[give].parent = i_a;

        let a_aabb = AABB::combine(&self.nodes[i_other].aabb, &self.nodes[give].aabb);
        self.nodes[i_a].aabb = a_aabb;
        let up_aabb = AABB::combine(&a_aabb, &self.nodes[keep].aabb);
        self.nodes[i_up].aabb = up_aabb;

        let a_height = 1 + self.nodes[i_other].height.max(self.nodes[give].height);
        self.nodes[i_a].height = a_height;
        self.nodes[i_up].height = 1 + a_height.max(self.nodes[keep].height);

        i_up
    }

    /// Height of the tree; 0 for a single leaf or an empty tree.
    pub fn height(&self) -> i32 {
        if self.root == NULL_NODE {
            0
        } else {
            self.nodes[self.root].height
        }
    }

    /// Max balance of any internal node: the height difference between its children.
    pub fn max_balance(&self) -> i32 {
        self.nodes
            .iter()
            .filter(|n| n.height > 1)
            .map(|n| (self.nodes[n.child2].height - self.nodes[n.child1].height).abs())
            .max()
            .unwrap_or(0)
    }

    /// Ratio of the sum of node perimeters to the root perimeter.
    pub fn area_ratio(&self) -> f64 {
        if self.root == NULL_NODE {
            return 0.0;
        }
        let root_area = self.nodes[self.root].aabb.perimeter();
        let total_area: f64 = self
            .nodes
            .iter()
            .filter(|n| n.height >= 0)
            .map(|n| n.aabb.perimeter())
            .sum();
        total_area / root_area
    }

    /// Checks the structure and metrics of the tree, panicking on corruption.
    pub fn validate(&self) {
        self.validate_structure(self.root);
        self.validate_metrics(self.root);

        let mut free_count = 0;
        let mut free_index = self.free_list;
        while free_index != NULL_NODE {
            free_index = self.nodes[free_index].parent;
            free_count += 1;
        }
        assert_eq!(self.height(), self.compute_height(self.root));
        let live = self.nodes.iter().filter(|n| n.height >= 0).count();
        assert_eq!(live + free_count, self.nodes.len());
    }

    fn compute_height(&self, index: usize) -> i32 {
        if index == NULL_NODE {
            return 0;
        }
        let node = &self.nodes[index];
        if node.is_leaf() {
            return 0;
        }
        1 + self.compute_height(node.child1).max(self.compute_height(node.child2))
    }

    fn validate_structure(&self, index: usize) {
        if index == NULL_NODE {
            return;
        }
        if index == self.root {
            assert_eq!(self.nodes[index].parent, NULL_NODE);
        }
        let node = &self.nodes[index];
        if node.is_leaf() {
            assert_eq!(node.child2, NULL_NODE);
            assert_eq!(node.height, 0);
            assert!(node.user_data.is_some());
            return;
        }
        assert_eq!(self.nodes[node.child1].parent, index);
        assert_eq!(self.nodes[node.child2].parent, index);
        self.validate_structure(node.child1);
        self.validate_structure(node.child2);
    }

    fn validate_metrics(&self, index: usize) {
        if index == NULL_NODE {
            return;
        }
        let node = &self.nodes[index];
        if node.is_leaf() {
            return;
        }
        let h1 = self.nodes[node.child1].height;
        let h2 = self.nodes[node.child2].height;
        assert_eq!(node.height, 1 + h1.max(h2));
        let aabb = AABB::combine(&self.nodes[node.child1].aabb, &self.nodes[node.child2].aabb);
        assert_eq!(aabb, node.aabb);
        self.validate_metrics(node.child1);
        self.validate_metrics(node.child2);
    }

    /// Shifts every node by `-new_origin`.
    pub fn shift_origin(&mut self, new_origin: Vec2) {
        for node in self.nodes.iter_mut() {
            node.aabb.min -= new_origin;
            node.aabb.max -= new_origin;
        }
    }
}
