use common::models::NotificationMessage;
use std::collections::HashMap;
use tracing::warn;

const NICE_OUT: &str = "It's nice out! Enjoy a discount on us.";
const DISCOUNT: &str = "Enjoy a discount on us.";
const NOT_SO_NICE: &str = "Not so nice out? That's okay, enjoy a discount on us.";

/// Subject used when a condition code has no mapping. An unmapped code is a
/// data-quality signal, not an error: it is logged and the fallback is sent.
pub const FALLBACK_SUBJECT: &str = DISCOUNT;

fn default_subject_table() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("sunny", NICE_OUT),
        ("clear", NICE_OUT),
        ("chanceflurries", DISCOUNT),
        ("chancerain", DISCOUNT),
        ("chancesleet", DISCOUNT),
        ("chancesnow", DISCOUNT),
        ("chancetstorms", DISCOUNT),
        ("partlycloudy", DISCOUNT),
        ("mostlycloudy", DISCOUNT),
        ("mostlysunny", DISCOUNT),
        ("partlysunny", DISCOUNT),
        ("rain", NOT_SO_NICE),
        ("sleet", NOT_SO_NICE),
        ("snow", NOT_SO_NICE),
        ("flurries", NOT_SO_NICE),
        ("fog", NOT_SO_NICE),
        ("hazy", NOT_SO_NICE),
        ("tstorms", NOT_SO_NICE),
        ("cloudy", NOT_SO_NICE),
    ])
}

/// Renders notification messages from subscriber and forecast data.
///
/// Pure value-in, value-out: no I/O beyond the data-quality log line, no
/// shared mutable state, deterministic for identical inputs.
pub struct NotificationComposer {
    subjects: HashMap<&'static str, &'static str>,
    fallback: &'static str,
}

impl NotificationComposer {
    pub fn new() -> Self {
        Self {
            subjects: default_subject_table(),
            fallback: FALLBACK_SUBJECT,
        }
    }

    pub fn with_table(
        subjects: HashMap<&'static str, &'static str>,
        fallback: &'static str,
    ) -> Self {
        Self { subjects, fallback }
    }

    pub fn compose(
        &self,
        email: &str,
        conditions: &str,
        city: &str,
        state: &str,
        temperature: f64,
    ) -> NotificationMessage {
        let subject = match self.subjects.get(conditions) {
            Some(subject) => *subject,
            None => {
                warn!(
                    conditions = %conditions,
                    "No subject mapping for condition, using fallback"
                );
                self.fallback
            }
        };

        let username = local_part(email);
        let body = format!(
            "<html>\n  <body>\n    <p>Hi {username},</p>\n    <p>It is {conditions} \
             and {temperature:.1}&deg;F right now in {city}, {state}.</p>\n    \
             <p>Check your inbox tomorrow for the next update. Stay comfortable out there!</p>\n  \
             </body>\n</html>\n"
        );

        NotificationMessage {
            recipient: email.to_string(),
            subject: subject.to_string(),
            body,
        }
    }
}

impl Default for NotificationComposer {
    fn default() -> Self {
        Self::new()
    }
}

/// The username portion of an email address, i.e. everything before the "@".
fn local_part(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_weather_condition_maps_to_consolation_subject() {
        let composer = NotificationComposer::new();
        let message = composer.compose("a@b.com", "sleet", "Duluth", "MN", 28.0);
        assert_eq!(
            message.subject,
            "Not so nice out? That's okay, enjoy a discount on us."
        );
    }

    #[test]
    fn nice_weather_condition_maps_to_sunny_subject() {
        let composer = NotificationComposer::new();
        let message = composer.compose("a@b.com", "sunny", "Phoenix", "AZ", 98.2);
        assert_eq!(message.subject, "It's nice out! Enjoy a discount on us.");
    }

    #[test]
    fn unmapped_condition_falls_back() {
        let composer = NotificationComposer::new();
        let message = composer.compose("a@b.com", "tornado", "Topeka", "KS", 71.0);
        assert_eq!(message.subject, "Enjoy a discount on us.");
    }

    #[test]
    fn compose_is_deterministic() {
        let composer = NotificationComposer::new();
        let first = composer.compose("john_whatevs@email.com", "cloudy", "Seattle", "WA", 54.35);
        let second = composer.compose("john_whatevs@email.com", "cloudy", "Seattle", "WA", 54.35);
        assert_eq!(first, second);
    }

    #[test]
    fn body_addresses_username_and_formats_temperature() {
        let composer = NotificationComposer::new();
        let message = composer.compose("john_whatevs@email.com", "cloudy", "Seattle", "WA", 54.32);
        assert!(message.body.contains("Hi john_whatevs,"));
        assert!(message.body.contains("54.3&deg;F"));
        assert!(message.body.contains("Seattle, WA"));
        assert_eq!(message.recipient, "john_whatevs@email.com");
    }

    #[test]
    fn local_part_strips_domain() {
        assert_eq!(local_part("john_whatevs@email.com"), "john_whatevs");
        assert_eq!(local_part("no-at-sign"), "no-at-sign");
    }
}
