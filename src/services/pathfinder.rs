use crate::models::{place_key, Route};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

/// Undirected graph of stops, one edge per stored route weighted by distance.
#[derive(Debug, Default)]
pub struct RouteGraph {
    /// Normalised key -> node index
    index: HashMap<String, usize>,
    /// Display name per node, the first spelling seen
    names: Vec<String>,
    adjacency: Vec<Vec<(usize, f64)>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShortestPath {
    /// Stop names in travel order, endpoints included
    pub stops: Vec<String>,
    pub distance_km: f64,
}

/// Heap entry; ordered so `BinaryHeap` pops the smallest distance first.
#[derive(Debug, PartialEq)]
struct State {
    distance: f64,
    node: usize,
}

impl Eq for State {}

impl Ord for State {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for State {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl RouteGraph {
    pub fn from_routes(routes: &[Route]) -> Self {
        let mut graph = Self::default();
        for route in routes {
            let a = graph.node(&route.origin);
            let b = graph.node(&route.destination);
            if a == b {
                continue;
            }
            graph.adjacency[a].push((b, route.distance_km));
            graph.adjacency[b].push((a, route.distance_km));
        }
        graph
    }

    fn node(&mut self, name: &str) -> usize {
        let key = place_key(name);
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.names.len();
        self.index.insert(key, idx);
        self.names.push(name.trim().to_string());
        self.adjacency.push(Vec::new());
        idx
    }

    pub fn node_count(&self) -> usize {
        self.names.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(&place_key(name))
    }

    /// Dijkstra from `from` to `to`. `None` when either stop is unknown or
    /// the two are not connected.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<ShortestPath> {
        let source = *self.index.get(&place_key(from))?;
        let target = *self.index.get(&place_key(to))?;

        let mut dist = vec![f64::INFINITY; self.names.len()];
        let mut prev: Vec<Option<usize>> = vec![None; self.names.len()];
        let mut heap = BinaryHeap::new();

        dist[source] = 0.0;
        heap.push(State {
            distance: 0.0,
            node: source,
        });

        while let Some(State { distance, node }) = heap.pop() {
            if node == target {
                break;
            }
            if distance > dist[node] {
                continue;
            }
            for &(next, weight) in &self.adjacency[node] {
                let candidate = distance + weight;
                if candidate < dist[next] {
                    dist[next] = candidate;
                    prev[next] = Some(node);
                    heap.push(State {
                        distance: candidate,
                        node: next,
                    });
                }
            }
        }

        if !dist[target].is_finite() {
            return None;
        }

        let mut stops = vec![self.names[target].clone()];
        let mut current = target;
        while let Some(p) = prev[current] {
            stops.push(self.names[p].clone());
            current = p;
        }
        stops.reverse();

        Some(ShortestPath {
            stops,
            distance_km: dist[target],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;

    fn route(id: i64, origin: &str, destination: &str, distance_km: f64) -> Route {
        Route {
            id,
            origin: origin.to_string(),
            destination: destination.to_string(),
            distance_km,
            ticket_price: None,
            duration_min: None,
            coords: vec![],
            stops: vec![],
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_prefers_shorter_multi_hop_path() {
        let graph = RouteGraph::from_routes(&[
            route(1, "Delhi", "Mumbai", 1400.0),
            route(2, "Delhi", "Jaipur", 281.0),
            route(3, "Jaipur", "Mumbai", 1150.0),
            route(4, "Jaipur", "Ahmedabad", 670.0),
            route(5, "Ahmedabad", "Mumbai", 530.0),
        ]);

        let path = graph.shortest_path("Delhi", "Mumbai").unwrap();
        assert_eq!(path.stops, vec!["Delhi", "Mumbai"]);
        assert_eq!(path.distance_km, 1400.0);

        let graph = RouteGraph::from_routes(&[
            route(1, "Delhi", "Mumbai", 1500.0),
            route(2, "Delhi", "Jaipur", 281.0),
            route(4, "Jaipur", "Ahmedabad", 670.0),
            route(5, "Ahmedabad", "Mumbai", 530.0),
        ]);
        let path = graph.shortest_path("Delhi", "Mumbai").unwrap();
        assert_eq!(path.stops, vec!["Delhi", "Jaipur", "Ahmedabad", "Mumbai"]);
        assert_eq!(path.distance_km, 1481.0);
    }

    #[test]
    fn test_edges_are_undirected() {
        let graph = RouteGraph::from_routes(&[route(1, "Delhi", "Agra", 233.0)]);
        let path = graph.shortest_path("Agra", "Delhi").unwrap();
        assert_eq!(path.stops, vec!["Agra", "Delhi"]);
    }

    #[test]
    fn test_names_are_normalised() {
        let graph = RouteGraph::from_routes(&[
            route(1, "Delhi", "Agra", 233.0),
            route(2, " agra ", "Lucknow", 335.0),
        ]);
        assert_eq!(graph.node_count(), 3);
        assert!(graph.contains("DELHI"));

        let path = graph.shortest_path("delhi", "LUCKNOW").unwrap();
        assert_eq!(path.stops, vec!["Delhi", "Agra", "Lucknow"]);
        assert_eq!(path.distance_km, 568.0);
    }

    #[test]
    fn test_unknown_or_disconnected() {
        let graph = RouteGraph::from_routes(&[
            route(1, "Delhi", "Agra", 233.0),
            route(2, "Chennai", "Bangalore", 346.0),
        ]);
        assert!(graph.shortest_path("Delhi", "Atlantis").is_none());
        assert!(graph.shortest_path("Delhi", "Chennai").is_none());
    }

    #[test]
    fn test_parallel_routes_use_cheapest_edge() {
        let graph = RouteGraph::from_routes(&[
            route(1, "Mumbai", "Pune", 160.0),
            route(2, "Pune", "Mumbai", 148.0),
        ]);
        let path = graph.shortest_path("Mumbai", "Pune").unwrap();
        assert_eq!(path.distance_km, 148.0);
    }

    #[test]
    fn test_heap_pops_smallest_first() {
        let mut heap = BinaryHeap::new();
        heap.push(State { distance: 5.0, node: 0 });
        heap.push(State { distance: 1.0, node: 2 });
        heap.push(State { distance: 1.0, node: 1 });
        assert_eq!(heap.pop().map(|s| s.node), Some(1));
        assert_eq!(heap.pop().map(|s| s.node), Some(2));
        assert_eq!(heap.pop().map(|s| s.node), Some(0));
    }
}
