// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Feature advertisement (`supports`) derived from permissions and consent.

use richmedia_core::types::{ConsentFlags, Feature, FeatureSet, Permission, PermissionSet};

/// Features every creative may use regardless of permissions.
const BASELINE: [Feature; 5] = [
    Feature::Level1,
    Feature::Level2,
    Feature::Screen,
    Feature::Orientation,
    Feature::Network,
];

/// Features appended after the permission-gated ones.
const TRAILING: [Feature; 4] = [Feature::Video, Feature::Audio, Feature::Map, Feature::Email];

/// Compute the advertisement for one state sync.
///
/// Append order is part of the wire format.
pub fn compute_advertisement(permissions: &PermissionSet, consent: &ConsentFlags) -> FeatureSet {
    let mut features = FeatureSet::new();
    for feature in BASELINE {
        features.push(feature);
    }

    if consent.allow_location_services && permissions.has_any_location() {
        features.push(Feature::Location);
    }
    if permissions.contains(Permission::SendSms) {
        features.push(Feature::Sms);
    }
    if permissions.contains(Permission::CallPhone) {
        features.push(Feature::Phone);
    }
    if permissions.contains(Permission::ReadCalendar) && permissions.contains(Permission::WriteCalendar)
    {
        features.push(Feature::Calendar);
    }

    for feature in TRAILING {
        features.push(feature);
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALWAYS: [&str; 9] = [
        "level-1",
        "level-2",
        "screen",
        "orientation",
        "network",
        "video",
        "audio",
        "map",
        "email",
    ];

    #[test]
    fn every_gated_combination() {
        for mask in 0u8..16 {
            let location = mask & 1 != 0;
            let sms = mask & 2 != 0;
            let phone = mask & 4 != 0;
            let calendar = mask & 8 != 0;

            let mut permissions = PermissionSet::new();
            if location {
                permissions.grant(Permission::FineLocation);
            }
            if sms {
                permissions.grant(Permission::SendSms);
            }
            if phone {
                permissions.grant(Permission::CallPhone);
            }
            if calendar {
                permissions.grant(Permission::ReadCalendar);
                permissions.grant(Permission::WriteCalendar);
            }
            let consent = ConsentFlags {
                allow_location_services: true,
            };

            let features = compute_advertisement(&permissions, &consent);
            let tags = features.tags();

            for tag in ALWAYS {
                assert!(tags.contains(&tag), "mask {mask}: missing {tag}");
            }
            assert_eq!(features.contains(Feature::Location), location, "mask {mask}");
            assert_eq!(features.contains(Feature::Sms), sms, "mask {mask}");
            assert_eq!(features.contains(Feature::Phone), phone, "mask {mask}");
            assert_eq!(features.contains(Feature::Calendar), calendar, "mask {mask}");
            assert_eq!(features.len(), 9 + mask.count_ones() as usize);
        }
    }

    #[test]
    fn full_grant_preserves_append_order() {
        let features = compute_advertisement(
            &PermissionSet::all(),
            &ConsentFlags {
                allow_location_services: true,
            },
        );
        assert_eq!(
            features.tags(),
            vec![
                "level-1",
                "level-2",
                "screen",
                "orientation",
                "network",
                "location",
                "sms",
                "phone",
                "calendar",
                "video",
                "audio",
                "map",
                "email",
            ]
        );
    }

    #[test]
    fn location_needs_consent_as_well_as_permission() {
        let permissions: PermissionSet = [Permission::CoarseLocation].into_iter().collect();
        let without = compute_advertisement(&permissions, &ConsentFlags::default());
        assert!(!without.contains(Feature::Location));

        let consent = ConsentFlags {
            allow_location_services: true,
        };
        assert!(compute_advertisement(&permissions, &consent).contains(Feature::Location));
        assert!(!compute_advertisement(&PermissionSet::new(), &consent).contains(Feature::Location));
    }

    #[test]
    fn calendar_needs_read_and_write() {
        let read_only: PermissionSet = [Permission::ReadCalendar].into_iter().collect();
        let write_only: PermissionSet = [Permission::WriteCalendar].into_iter().collect();
        let consent = ConsentFlags::default();
        assert!(!compute_advertisement(&read_only, &consent).contains(Feature::Calendar));
        assert!(!compute_advertisement(&write_only, &consent).contains(Feature::Calendar));
    }
}
