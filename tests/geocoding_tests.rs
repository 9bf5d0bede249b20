use busroute::cache::{GeocodeCache, MemoryCacheService};
use busroute::config::GeocodingConfig;
use busroute::constants::DEFAULT_NOMINATIM_BASE_URL;
use busroute::services::GeocodingService;
use std::sync::Arc;

mod common;

fn live_service() -> GeocodingService {
    let config = GeocodingConfig {
        enabled: true,
        nominatim_base_url: DEFAULT_NOMINATIM_BASE_URL.to_string(),
        google_api_key: std::env::var("GOOGLE_MAPS_API_KEY").ok(),
    };
    let cache: Arc<dyn GeocodeCache> = Arc::new(MemoryCacheService::new(3600, 100));
    GeocodingService::new(&config, cache).expect("HTTP client")
}

#[tokio::test]
async fn test_geocode_known_city() {
    if common::should_skip_real_api_tests() {
        println!("Skipping real API test");
        return;
    }

    let service = live_service();
    let agra = service
        .coordinates("Agra, India")
        .await
        .expect("Agra should resolve");

    // Within a few tenths of a degree of the city centre
    assert!((agra.lat - 27.18).abs() < 0.3, "lat was {}", agra.lat);
    assert!((agra.lng - 78.01).abs() < 0.3, "lng was {}", agra.lng);
}

#[tokio::test]
async fn test_route_polyline_between_cities() {
    if common::should_skip_real_api_tests() {
        println!("Skipping real API test");
        return;
    }

    let service = live_service();
    let polyline = service.route_polyline("Mumbai, India", "Pune, India").await;

    assert_eq!(polyline.len(), 2, "Both endpoints should resolve");
    assert!(
        polyline[0].lat > polyline[1].lat,
        "Mumbai lies north of Pune"
    );
}
