use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use schedule_cell::{rolling_week, AvailabilityStore};
use shared_api::BookingApiClient;
use shared_config::AppConfig;

/// Demo driver: fetch a doctor's weekly schedule and print the rolling
/// 7-day slot table the booking screens render from.
#[tokio::main]
async fn main() -> Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let doctor_id = std::env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: booking-cli <doctor-id>"))?;
    let doctor_id = Uuid::parse_str(&doctor_id).context("doctor id must be a UUID")?;

    let config = AppConfig::from_env();
    if !config.is_configured() {
        return Err(anyhow!("BOOKING_API_URL and BOOKING_API_KEY must be set"));
    }

    info!("Fetching schedule for doctor {}", doctor_id);

    let api = Arc::new(BookingApiClient::new(&config));
    let store = AvailabilityStore::new(api, doctor_id);
    store.fetch_schedule().await?;

    let snapshot = store.snapshot().await;
    let today = chrono::Utc::now().date_naive();

    for (weekday, date) in rolling_week(today) {
        println!("{} {}", weekday, date);
        match snapshot.schedule.get(&weekday) {
            Some(slots) => {
                for slot in slots {
                    let marker = if slot.is_booked {
                        "booked"
                    } else if !slot.is_bookable || !slot.is_available {
                        "unavailable"
                    } else {
                        "open"
                    };
                    println!("  {:<15} {}", slot.display_time(), marker);
                }
            }
            None => println!("  (no availability)"),
        }
    }

    Ok(())
}
