use clap::{Parser, Subcommand};

/// EVCharge: charging station locator and slot booking backend
#[derive(Parser)]
#[command(name = "evcharge", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Port to bind
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },

    /// Inspect station listings
    Station {
        #[command(subcommand)]
        command: StationCommands,
    },

    /// Inspect and administer bookings
    Booking {
        #[command(subcommand)]
        command: BookingCommands,
    },
}

#[derive(Subcommand)]
pub enum StationCommands {
    /// List stations (all active, or one owner's)
    List {
        #[arg(long)]
        owner_id: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum BookingCommands {
    /// List a user's bookings
    List {
        #[arg(long)]
        user_id: String,
    },
    /// Cancel a booking by id (admin path, no ownership check)
    Cancel {
        #[arg(long)]
        booking_id: String,
    },
}
