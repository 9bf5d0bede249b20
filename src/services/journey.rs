use crate::config::FarePolicy;
use crate::error::{AppError, Result};
use crate::models::route::Direction;
use crate::models::{Coordinates, FareSource, Journey, JourneyLeg, Route};
use crate::services::fares::round2;
use crate::services::pathfinder::RouteGraph;

/// Finds the shortest journey between two stops and prices it.
#[derive(Debug, Clone, Copy)]
pub struct JourneyPlanner {
    fares: FarePolicy,
}

/// Per-leg details gathered from the stored routes.
#[derive(Debug, Default)]
struct Reconciled {
    legs: Vec<JourneyLeg>,
    coords: Vec<Coordinates>,
    /// Sum of ticket prices, `None` unless every leg had one
    ticket_total: Option<f64>,
}

impl JourneyPlanner {
    pub fn new(fares: FarePolicy) -> Self {
        Self { fares }
    }

    pub fn fares(&self) -> &FarePolicy {
        &self.fares
    }

    pub fn plan(&self, routes: &[Route], from: &str, to: &str) -> Result<Journey> {
        let graph = RouteGraph::from_routes(routes);
        let shortest = graph.shortest_path(from, to).ok_or_else(|| {
            AppError::NotFound(format!(
                "No route found from {} to {}",
                from.trim(),
                to.trim()
            ))
        })?;

        tracing::debug!(
            hops = shortest.stops.len().saturating_sub(1),
            distance_km = shortest.distance_km,
            "Shortest path {}",
            shortest.stops.join(" -> ")
        );

        let reconciled = reconcile(&shortest.stops, routes);
        let computed = self.fares.fare_for(shortest.distance_km);
        let (fare, fare_source) = match reconciled.ticket_total {
            Some(total) => (round2(total), FareSource::TicketPrices),
            None => (computed, FareSource::Computed),
        };

        Ok(Journey {
            path: shortest.stops,
            distance_km: round2(shortest.distance_km),
            time_hours: self.fares.travel_time_hours(shortest.distance_km),
            fare,
            fare_source,
            coords: reconciled.coords,
            legs: reconciled.legs,
        })
    }
}

/// Match each consecutive pair of `path` to the first stored route joining
/// it, collecting coordinates in travel order and ticket prices.
fn reconcile(path: &[String], routes: &[Route]) -> Reconciled {
    let mut out = Reconciled::default();
    let mut ticket_total = 0.0;
    let mut all_priced = true;

    for pair in path.windows(2) {
        let (from, to) = (&pair[0], &pair[1]);
        let matched = routes
            .iter()
            .find_map(|route| route.connects(from, to).map(|dir| (route, dir)));

        let leg = match matched {
            Some((route, direction)) => {
                let mut coords = route.coords.clone();
                if direction == Direction::Reverse {
                    coords.reverse();
                }
                for point in coords {
                    if out.coords.last() != Some(&point) {
                        out.coords.push(point);
                    }
                }

                match route.ticket_price {
                    Some(price) => ticket_total += price,
                    None => all_priced = false,
                }

                JourneyLeg {
                    from: from.clone(),
                    to: to.clone(),
                    route_id: Some(route.id),
                    distance_km: Some(route.distance_km),
                    ticket_price: route.ticket_price,
                }
            }
            None => {
                all_priced = false;
                JourneyLeg {
                    from: from.clone(),
                    to: to.clone(),
                    route_id: None,
                    distance_km: None,
                    ticket_price: None,
                }
            }
        };
        out.legs.push(leg);
    }

    if all_priced && !out.legs.is_empty() {
        out.ticket_total = Some(ticket_total);
    }
    out
}
