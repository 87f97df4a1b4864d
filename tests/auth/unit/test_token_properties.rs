use std::collections::HashSet;

use backup_api::auth::duration::parse_duration;
use backup_api::auth::{TokenError, SEALED_TOKEN_PREFIX};
use backup_api::domain::UserRole;
use chrono::Duration;

use crate::support::{backend, both_backends, user, ManualClock, BACKENDS};

#[test]
fn issued_tokens_verify_to_the_same_identity() {
    let clock = ManualClock::starting_now();
    for (name, service) in both_backends(&clock, Duration::hours(1)) {
        for role in [UserRole::Admin, UserRole::Member] {
            let subject = user("U1", role);
            let token = service.issue(&subject).unwrap();
            let payload = service.verify(&token).unwrap();

            assert_eq!(payload.user_id, subject.id, "{name}");
            assert_eq!(payload.role, role, "{name}");
            assert!(!payload.id.as_str().is_empty(), "{name}");
        }
    }
}

#[test]
fn admin_token_expires_after_its_lifetime() {
    for name in BACKENDS {
        let clock = ManualClock::starting_now();
        let service = backend(name, &clock, Duration::hours(1));
        let token = service.issue(&user("U1", UserRole::Admin)).unwrap();

        let payload = service.verify(&token).unwrap();
        assert_eq!(payload.user_id.as_str(), "U1", "{name}");
        assert!(payload.is_admin(), "{name}");

        clock.advance(Duration::hours(2));
        assert_eq!(service.verify(&token), Err(TokenError::ExpiredToken), "{name}");
    }
}

#[test]
fn token_is_valid_through_its_final_second() {
    for name in BACKENDS {
        let clock = ManualClock::starting_now();
        let service = backend(name, &clock, Duration::minutes(10));
        let token = service.issue(&user("U2", UserRole::Member)).unwrap();

        clock.advance(Duration::minutes(10));
        assert!(service.verify(&token).is_ok(), "{name}");

        clock.advance(Duration::seconds(1));
        assert_eq!(service.verify(&token), Err(TokenError::ExpiredToken), "{name}");
    }
}

#[test]
fn token_expires_as_soon_as_its_lifetime_has_passed() {
    for name in BACKENDS {
        let clock = ManualClock::starting_now();
        let service = backend(name, &clock, Duration::minutes(1));
        let token = service.issue(&user("U3", UserRole::Admin)).unwrap();

        clock.advance(Duration::seconds(60));
        assert!(service.verify(&token).is_ok(), "{name}");

        clock.advance(Duration::milliseconds(1));
        assert_eq!(service.verify(&token), Err(TokenError::ExpiredToken), "{name}");
    }
}

#[test]
fn sub_second_lifetimes_cannot_be_configured() {
    for duration in ["500ms", "1500ms", "0.5s"] {
        assert!(parse_duration(duration).is_err(), "{duration}");
    }
}

#[test]
fn any_single_character_change_is_rejected_as_invalid() {
    let clock = ManualClock::starting_now();
    for (name, service) in both_backends(&clock, Duration::hours(1)) {
        let token = service.issue(&user("U1", UserRole::Admin)).unwrap();

        for (index, original) in token.char_indices() {
            let replacement = if original == 'A' { 'B' } else { 'A' };
            let mut tampered = token.clone();
            tampered.replace_range(index..index + original.len_utf8(), &replacement.to_string());

            assert_eq!(
                service.verify(&tampered),
                Err(TokenError::InvalidToken),
                "{name}: change at {index} was accepted or misreported"
            );
        }
    }
}

#[test]
fn tampered_and_expired_is_still_invalid() {
    for name in BACKENDS {
        let clock = ManualClock::starting_now();
        let service = backend(name, &clock, Duration::hours(1));
        let mut tampered = service.issue(&user("U1", UserRole::Admin)).unwrap();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        clock.advance(Duration::hours(3));
        assert_eq!(service.verify(&tampered), Err(TokenError::InvalidToken), "{name}");
    }
}

#[test]
fn tokens_are_unique_per_issuance() {
    let clock = ManualClock::starting_now();
    for (name, service) in both_backends(&clock, Duration::hours(1)) {
        let subject = user("U1", UserRole::Member);
        let mut tokens = HashSet::new();
        let mut token_ids = HashSet::new();

        for _ in 0..100 {
            let token = service.issue(&subject).unwrap();
            token_ids.insert(service.verify(&token).unwrap().id);
            tokens.insert(token);
        }

        assert_eq!(tokens.len(), 100, "{name}");
        assert_eq!(token_ids.len(), 100, "{name}");
    }
}

#[test]
fn backends_do_not_accept_each_others_tokens() {
    let clock = ManualClock::starting_now();
    let backends = both_backends(&clock, Duration::hours(1));
    let (_, jwt) = &backends[0];
    let (_, sealed) = &backends[1];
    let subject = user("U1", UserRole::Admin);

    let jwt_token = jwt.issue(&subject).unwrap();
    let sealed_token = sealed.issue(&subject).unwrap();

    assert!(sealed_token.starts_with(SEALED_TOKEN_PREFIX));
    assert_eq!(sealed.verify(&jwt_token), Err(TokenError::InvalidToken));
    assert_eq!(jwt.verify(&sealed_token), Err(TokenError::InvalidToken));
}

#[test]
fn tokens_verify_concurrently() {
    let clock = ManualClock::starting_now();
    for (name, service) in both_backends(&clock, Duration::hours(1)) {
        let handles: Vec<_> = (0..8)
            .map(|n| {
                let service = service.clone();
                std::thread::spawn(move || {
                    let subject = user(&format!("U{n}"), UserRole::Member);
                    let token = service.issue(&subject).unwrap();
                    service.verify(&token).unwrap().user_id == subject.id
                })
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap(), "{name}");
        }
    }
}
