use chrono::{Duration, Utc};
use weatherlink::Client;

fn main() -> weatherlink::Result<()> {
    // Example program that calls the library API.
    // Configure credentials via env vars or a `.weatherlinkrc` file.
    let client = Client::from_env()?;

    for station in client.all_stations()?.stations {
        println!(
            "Found station ID {} ({})",
            station.station_id, station.station_name
        );

        let current = client.current(station.station_id)?;
        for sensor in &current.sensors {
            for data in &sensor.data {
                println!("Wind Direction: {:?}", data.wind_dir);
                println!("Wind Speed: {:?}", data.wind_speed);
                if let Some(ts) = data.timestamp() {
                    println!("Last updated: {}", ts);
                }
            }
        }

        let end = Utc::now() - Duration::minutes(30);
        let start = end - Duration::minutes(30);
        let historic = client.historic(station.station_id, start, end)?;

        println!("Historic data...");
        for sensor in &historic.sensors {
            for data in &sensor.data {
                if let Some(ts) = data.timestamp() {
                    println!("Date: {}", ts);
                }
                println!("Prevailing wind Direction: {:?}", data.wind_dir_of_prevail);
                println!("Wind Speed high: {:?}", data.wind_speed_hi);
            }
        }
    }

    Ok(())
}
