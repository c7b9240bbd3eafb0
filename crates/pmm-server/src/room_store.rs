//! Thread-safe keyed room store with a secondary uniqueness index on the
//! host's player full name, plus sorted/filtered range queries.
//!
//! Grounded on the original `thread_safe_data_container.hpp`'s contracts
//! (`add_data`, `assign_id_and_add_data`, `get_data(cmp, filter)`,
//! `get_range_data`) and on the locking idiom of the GlobedGD reference
//! implementation: a single `parking_lot::RwLock` guarding both the
//! primary map and its index, because critical sections here are plain
//! hash-map mutation — never an `await` point — so a blocking lock that
//! never suspends the executor is the right tool (spec §5: "must not
//! suspend while holding the store's internal lock").

use std::collections::HashMap;

use parking_lot::RwLock;
use pmm_core::player_name::PlayerFullName;
use pmm_core::room::{Room, RoomSearchTargetFlags, RoomSortKind};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoomStoreError {
    #[error("a room already exists with that unique field value")]
    UniqueFieldDuplicated,
    #[error("no room with that id exists")]
    NotFound,
}

#[derive(Default)]
struct Inner {
    rooms: HashMap<u32, Room>,
    host_name_index: HashMap<PlayerFullName, u32>,
}

impl Inner {
    /// Returns an error if `room`'s unique fields collide with a *different*
    /// room. Updating a room with its own existing values is allowed.
    fn check_unique(&self, room: &Room) -> Result<(), RoomStoreError> {
        if let Some(&existing_id) = self.host_name_index.get(&room.host_player_full_name)
            && existing_id != room.room_id
        {
            return Err(RoomStoreError::UniqueFieldDuplicated);
        }
        Ok(())
    }

    fn insert(&mut self, room: Room) {
        if let Some(old) = self.rooms.get(&room.room_id) {
            self.host_name_index.remove(&old.host_player_full_name);
        }
        self.host_name_index.insert(room.host_player_full_name.clone(), room.room_id);
        self.rooms.insert(room.room_id, room);
    }
}

pub struct RoomStore {
    inner: RwLock<Inner>,
}

impl Default for RoomStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomStore {
    pub fn new() -> Self {
        Self { inner: RwLock::new(Inner::default()) }
    }

    /// Insert `room` (by its existing `room_id`) or replace the room with
    /// that id if present. Fails if a *different* room already has the
    /// same host full name.
    pub fn add_or_update(&self, room: Room) -> Result<(), RoomStoreError> {
        let mut inner = self.inner.write();
        inner.check_unique(&room)?;
        inner.insert(room);
        Ok(())
    }

    /// Draw random ids until an unused one is found, write it into `room`,
    /// and insert. The id space is 32-bit and rooms are expected to number
    /// in the thousands, so collisions are rare enough that an unbounded
    /// retry loop is the correct tool (per spec §4.2).
    pub fn assign_id_and_add(&self, mut room: Room) -> Result<u32, RoomStoreError> {
        let mut inner = self.inner.write();
        loop {
            let candidate = rand::random_range(1..=u32::MAX);
            if !inner.rooms.contains_key(&candidate) {
                room.room_id = candidate;
                inner.check_unique(&room)?;
                inner.insert(room);
                return Ok(candidate);
            }
        }
    }

    pub fn try_remove(&self, id: u32) -> bool {
        let mut inner = self.inner.write();
        match inner.rooms.remove(&id) {
            Some(room) => {
                inner.host_name_index.remove(&room.host_player_full_name);
                true
            },
            None => false,
        }
    }

    pub fn get(&self, id: u32) -> Result<Room, RoomStoreError> {
        self.inner.read().rooms.get(&id).cloned().ok_or(RoomStoreError::NotFound)
    }

    pub fn contains(&self, id: u32) -> bool {
        self.inner.read().rooms.contains_key(&id)
    }

    pub fn size(&self) -> usize {
        self.inner.read().rooms.len()
    }

    /// Snapshot rooms matching `pred`, sorted per `sort_kind`, optionally
    /// promoting exact `search_name` matches to the front (§4.6's
    /// `list_room_request` contract). Snapshotting happens under the read
    /// lock; the sort itself runs on the owned copy outside the lock.
    pub fn search(
        &self,
        target_flags: RoomSearchTargetFlags,
        search_name: Option<&str>,
        sort_kind: RoomSortKind,
    ) -> Vec<Room> {
        let mut rooms: Vec<Room> = {
            let inner = self.inner.read();
            inner
                .rooms
                .values()
                .filter(|room| room_matches_target_flags(room, target_flags))
                .filter(|room| match search_name {
                    Some(name) if !name.is_empty() => room
                        .host_player_full_name
                        .name
                        .as_str()
                        .map(|host_name| host_name.contains(name))
                        .unwrap_or(false),
                    _ => true,
                })
                .cloned()
                .collect()
        };

        rooms.sort_by(|a, b| compare_rooms(a, b, sort_kind));

        if let Some(name) = search_name.filter(|n| !n.is_empty()) {
            rooms.sort_by_key(|room| {
                let exact = room.host_player_full_name.name.as_str().map(|n| n == name).unwrap_or(false);
                !exact // exact matches (false negated to 0) sort first
            });
        }

        rooms
    }

    /// `search`, then the window `[start, start+count)`, clamped to the
    /// sorted length: `start >= len` yields an empty slice, and `count` is
    /// silently truncated at the end (spec §4.2).
    pub fn search_range(
        &self,
        start: usize,
        count: usize,
        target_flags: RoomSearchTargetFlags,
        search_name: Option<&str>,
        sort_kind: RoomSortKind,
    ) -> (Vec<Room>, usize) {
        let matched = self.search(target_flags, search_name, sort_kind);
        let matched_count = matched.len();
        if start >= matched_count {
            return (Vec::new(), matched_count);
        }
        let end = (start + count).min(matched_count);
        (matched[start..end].to_vec(), matched_count)
    }
}

fn room_matches_target_flags(room: &Room, target_flags: RoomSearchTargetFlags) -> bool {
    let visibility_ok = if room.is_public() {
        target_flags.contains(RoomSearchTargetFlags::PUBLIC_ROOM)
    } else {
        target_flags.contains(RoomSearchTargetFlags::PRIVATE_ROOM)
    };
    let openness_ok = if room.is_open() {
        target_flags.contains(RoomSearchTargetFlags::OPEN_ROOM)
    } else {
        target_flags.contains(RoomSearchTargetFlags::CLOSED_ROOM)
    };
    visibility_ok && openness_ok
}

fn compare_rooms(a: &Room, b: &Room, sort_kind: RoomSortKind) -> std::cmp::Ordering {
    let name_a = a.host_player_full_name.name.as_str().unwrap_or_default();
    let name_b = b.host_player_full_name.name.as_str().unwrap_or_default();
    match sort_kind {
        RoomSortKind::NameAscending => name_a.cmp(name_b),
        RoomSortKind::NameDescending => name_b.cmp(name_a),
        RoomSortKind::CreateDatetimeAscending => a.create_datetime_unix.cmp(&b.create_datetime_unix),
        RoomSortKind::CreateDatetimeDescending => b.create_datetime_unix.cmp(&a.create_datetime_unix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pmm_core::test_helpers::sample_room;

    #[test]
    fn assign_id_and_add_then_get() {
        let store = RoomStore::new();
        let id = store.assign_id_and_add(sample_room(0, "alice", 4)).unwrap();
        assert!(store.contains(id));
        assert_eq!(store.get(id).unwrap().host_player_full_name.name.as_str().unwrap(), "alice");
    }

    #[test]
    fn add_or_update_is_idempotent() {
        let store = RoomStore::new();
        let room = sample_room(1, "bob", 4);
        store.add_or_update(room.clone()).unwrap();
        store.add_or_update(room).unwrap();
        assert_eq!(store.size(), 1);
    }

    #[test]
    fn duplicate_host_name_rejected() {
        let store = RoomStore::new();
        store.add_or_update(sample_room(1, "carol", 4)).unwrap();
        let collision = sample_room(2, "carol", 4);
        assert_eq!(store.add_or_update(collision), Err(RoomStoreError::UniqueFieldDuplicated));
    }

    #[test]
    fn updating_own_unique_value_is_allowed() {
        let store = RoomStore::new();
        let mut room = sample_room(1, "dana", 4);
        store.add_or_update(room.clone()).unwrap();
        room.current_player_count = 2;
        assert!(store.add_or_update(room).is_ok());
    }

    #[test]
    fn add_then_remove_restores_empty_store() {
        let store = RoomStore::new();
        let room = sample_room(7, "erin", 4);
        store.add_or_update(room).unwrap();
        assert!(store.try_remove(7));
        assert_eq!(store.size(), 0);
        assert!(!store.contains(7));
    }

    #[test]
    fn try_remove_reports_whether_room_existed() {
        let store = RoomStore::new();
        assert!(!store.try_remove(404));
    }

    #[test]
    fn get_missing_room_is_not_found() {
        let store = RoomStore::new();
        assert_eq!(store.get(1).unwrap_err(), RoomStoreError::NotFound);
    }

    #[test]
    fn search_range_clamps_past_end() {
        let store = RoomStore::new();
        for i in 1..=3u32 {
            store.add_or_update(sample_room(i, &format!("host{i}"), 4)).unwrap();
        }
        let target = RoomSearchTargetFlags::PUBLIC_ROOM | RoomSearchTargetFlags::OPEN_ROOM;
        let (window, matched) = store.search_range(10, 5, target, None, RoomSortKind::NameAscending);
        assert!(window.is_empty());
        assert_eq!(matched, 3);
    }

    #[test]
    fn search_range_truncates_count_at_end() {
        let store = RoomStore::new();
        for i in 1..=5u32 {
            store.add_or_update(sample_room(i, &format!("host{i}"), 4)).unwrap();
        }
        let target = RoomSearchTargetFlags::PUBLIC_ROOM | RoomSearchTargetFlags::OPEN_ROOM;
        let (window, matched) = store.search_range(3, 10, target, None, RoomSortKind::NameAscending);
        assert_eq!(window.len(), 2);
        assert_eq!(matched, 5);
    }

    #[test]
    fn search_sorts_by_name_ascending() {
        let store = RoomStore::new();
        store.add_or_update(sample_room(1, "zoe", 4)).unwrap();
        store.add_or_update(sample_room(2, "amy", 4)).unwrap();
        let target = RoomSearchTargetFlags::PUBLIC_ROOM | RoomSearchTargetFlags::OPEN_ROOM;
        let rooms = store.search(target, None, RoomSortKind::NameAscending);
        assert_eq!(rooms[0].host_player_full_name.name.as_str().unwrap(), "amy");
        assert_eq!(rooms[1].host_player_full_name.name.as_str().unwrap(), "zoe");
    }

    #[test]
    fn search_name_exact_match_sorts_first() {
        let store = RoomStore::new();
        store.add_or_update(sample_room(1, "alexandra", 4)).unwrap();
        store.add_or_update(sample_room(2, "alex", 4)).unwrap();
        let target = RoomSearchTargetFlags::PUBLIC_ROOM | RoomSearchTargetFlags::OPEN_ROOM;
        let rooms = store.search(target, Some("alex"), RoomSortKind::NameAscending);
        assert_eq!(rooms.len(), 2);
        assert_eq!(rooms[0].host_player_full_name.name.as_str().unwrap(), "alex");
    }
}
