//! Itinerary prompt construction

use atp_common::db::TripDetails;
use atp_common::time::IsoFormat;

/// Day structure the model is asked to reproduce for every day
pub const JSON_TEMPLATE: &str = r#"{
    "day_1": {
        "morning": {
            "main": "Primary morning activity",
            "alternatives": ["Alternative 1", "Alternative 2"]
        },
        "afternoon": {
            "main": "Primary afternoon activity",
            "alternatives": ["Alternative 1", "Alternative 2"]
        },
        "evening": {
            "main": "Primary evening activity",
            "alternatives": ["Alternative 1", "Alternative 2"]
        },
        "food": ["Restaurant 1", "Restaurant 2"],
        "tips": "Daily tips and notes"
    }
}"#;

/// Build the itinerary request sent to the model
pub fn build_prompt(trip: &TripDetails) -> String {
    format!(
        "Create a detailed {days}-day trip itinerary for a {trip_type} trip to {destination} \
         from {start_location} for {people} people.\n\
         Start Date: {start}\n\
         End Date: {end}\n\
         Interested Activities: {activities}\n\n\
         For each day, provide:\n\
         1. Morning activities with 2 alternative options\n\
         2. Afternoon activities with 2 alternative options\n\
         3. Evening activities with 2 alternative options\n\
         4. Recommended restaurants or food experiences\n\
         5. Travel tips and notes\n\n\
         Format the response as a JSON object with the following structure:\n\
         {template}",
        days = trip.number_of_days(),
        trip_type = trip.trip_type.as_str().to_lowercase(),
        destination = trip.destination,
        start_location = trip.start_location,
        people = trip.number_of_people,
        start = trip.start_date.iso_format(),
        end = trip.end_date.iso_format(),
        activities = trip.interested_activities,
        template = JSON_TEMPLATE,
    )
}
