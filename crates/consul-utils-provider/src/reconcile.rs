//! In-memory edits of config entry documents
//!
//! A document is a list of entries, each holding a list of members. Inserting
//! a member for an existing entry extends that entry; removing the last member
//! of an entry drops the entry. Nothing here talks to Consul.

use consul_utils_client::{
    ExportedService, ExportedServicesConfigEntry, ServiceConsumer, ServiceIntentionsConfigEntry,
    SourceIntention,
};

/// List-membership edits over a document
pub trait Reconcile {
    /// Value appended by `insert_member`
    type Member;
    /// Selector used by `remove_member` and `contains_member`
    type MemberKey<'a>: Copy;

    /// Append `member` under `entry`, creating the entry if it is absent.
    /// Identical members are not deduplicated.
    fn insert_member(&mut self, entry: &str, member: Self::Member);

    /// Remove the first member matching `key` under the first entry named
    /// `entry`. A miss leaves the document unchanged.
    fn remove_member(&mut self, entry: &str, key: Self::MemberKey<'_>);

    fn contains_member(&self, entry: &str, key: Self::MemberKey<'_>) -> bool;

    /// An empty document is deleted instead of written
    fn is_empty(&self) -> bool;
}

/// Entries are exported services, members are consumer peers
impl Reconcile for ExportedServicesConfigEntry {
    type Member = ServiceConsumer;
    type MemberKey<'a> = &'a str;

    fn insert_member(&mut self, entry: &str, member: ServiceConsumer) {
        match self.services.iter_mut().find(|service| service.name == entry) {
            Some(service) => service.consumers.push(member),
            None => self.services.push(ExportedService {
                name: entry.to_string(),
                consumers: vec![member],
                ..Default::default()
            }),
        }
    }

    fn remove_member(&mut self, entry: &str, peer: &str) {
        let Some(service_idx) = self.services.iter().position(|s| s.name == entry) else {
            return;
        };

        let consumers = &mut self.services[service_idx].consumers;
        let Some(consumer_idx) = consumers
            .iter()
            .position(|c| c.peer.as_deref() == Some(peer))
        else {
            return;
        };

        consumers.remove(consumer_idx);
        if consumers.is_empty() {
            self.services.remove(service_idx);
        }
    }

    fn contains_member(&self, entry: &str, peer: &str) -> bool {
        self.services
            .iter()
            .filter(|service| service.name == entry)
            .flat_map(|service| service.consumers.iter())
            .any(|consumer| consumer.peer.as_deref() == Some(peer))
    }

    fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

/// Entries are source services, each source carrying at most one peer.
///
/// A `None` peer selects the first source with the given name whatever its
/// peer is.
impl Reconcile for ServiceIntentionsConfigEntry {
    type Member = SourceIntention;
    type MemberKey<'a> = Option<&'a str>;

    /// Sources are flat, so the source name is the entry key
    fn insert_member(&mut self, entry: &str, mut member: SourceIntention) {
        member.name = entry.to_string();
        self.sources.push(member);
    }

    fn remove_member(&mut self, entry: &str, peer: Option<&str>) {
        if let Some(idx) = self
            .sources
            .iter()
            .position(|source| source_matches(source, entry, peer))
        {
            self.sources.remove(idx);
        }
    }

    fn contains_member(&self, entry: &str, peer: Option<&str>) -> bool {
        self.sources
            .iter()
            .any(|source| source_matches(source, entry, peer))
    }

    fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

fn source_matches(source: &SourceIntention, name: &str, peer: Option<&str>) -> bool {
    source.name == name && peer.is_none_or(|peer| source.peer.as_deref() == Some(peer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use consul_utils_client::IntentionAction;

    fn peers(doc: &ExportedServicesConfigEntry, service: &str) -> Vec<String> {
        doc.services
            .iter()
            .find(|s| s.name == service)
            .map(|s| s.consumers.iter().filter_map(|c| c.peer.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_insert_into_empty_document() {
        let mut doc = ExportedServicesConfigEntry::new("default");
        doc.insert_member("svc1", ServiceConsumer::peer("p1"));

        assert_eq!(doc.services.len(), 1);
        assert_eq!(doc.services[0].name, "svc1");
        assert_eq!(peers(&doc, "svc1"), vec!["p1"]);
    }

    #[test]
    fn test_insert_extends_existing_entry() {
        let mut doc = ExportedServicesConfigEntry::new("default");
        doc.insert_member("svc1", ServiceConsumer::peer("p1"));
        doc.insert_member("svc1", ServiceConsumer::peer("p2"));

        assert_eq!(doc.services.len(), 1);
        assert_eq!(peers(&doc, "svc1"), vec!["p1", "p2"]);
    }

    #[test]
    fn test_insert_does_not_deduplicate() {
        let mut doc = ExportedServicesConfigEntry::new("default");
        doc.insert_member("svc1", ServiceConsumer::peer("p1"));
        doc.insert_member("svc1", ServiceConsumer::peer("p1"));

        assert_eq!(peers(&doc, "svc1"), vec!["p1", "p1"]);
    }

    #[test]
    fn test_remove_keeps_other_members() {
        let mut doc = ExportedServicesConfigEntry::new("default");
        doc.insert_member("svc1", ServiceConsumer::peer("p1"));
        doc.insert_member("svc1", ServiceConsumer::peer("p2"));

        doc.remove_member("svc1", "p1");

        assert_eq!(peers(&doc, "svc1"), vec!["p2"]);
    }

    #[test]
    fn test_remove_only_first_match() {
        let mut doc = ExportedServicesConfigEntry::new("default");
        doc.insert_member("svc1", ServiceConsumer::peer("p1"));
        doc.insert_member("svc1", ServiceConsumer::peer("p1"));

        doc.remove_member("svc1", "p1");

        assert_eq!(peers(&doc, "svc1"), vec!["p1"]);
    }

    #[test]
    fn test_remove_last_member_empties_document() {
        let mut doc = ExportedServicesConfigEntry::new("default");
        doc.insert_member("svc1", ServiceConsumer::peer("p1"));

        doc.remove_member("svc1", "p1");

        assert!(doc.services.is_empty());
        assert!(doc.is_empty());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut doc = ExportedServicesConfigEntry::new("default");
        doc.insert_member("svc1", ServiceConsumer::peer("p1"));
        doc.insert_member("svc2", ServiceConsumer::peer("p2"));

        doc.remove_member("svc1", "p1");
        let once = doc.clone();
        doc.remove_member("svc1", "p1");

        assert_eq!(doc, once);
    }

    #[test]
    fn test_remove_missing_entry_or_member_is_noop() {
        let mut doc = ExportedServicesConfigEntry::new("default");
        doc.insert_member("svc1", ServiceConsumer::peer("p1"));
        let before = doc.clone();

        doc.remove_member("svc2", "p1");
        assert_eq!(doc, before);

        doc.remove_member("svc1", "p9");
        assert_eq!(doc, before);
    }

    #[test]
    fn test_insert_then_remove_restores_document() {
        let mut doc = ExportedServicesConfigEntry::new("default");
        doc.insert_member("a", ServiceConsumer::peer("p1"));
        doc.insert_member("b", ServiceConsumer::peer("p2"));
        doc.insert_member("c", ServiceConsumer::peer("p3"));
        let before = doc.clone();

        doc.insert_member("b", ServiceConsumer::peer("p9"));
        doc.remove_member("b", "p9");
        assert_eq!(doc, before);

        doc.insert_member("d", ServiceConsumer::peer("p4"));
        doc.remove_member("d", "p4");
        assert_eq!(doc, before);
    }

    #[test]
    fn test_contains_member() {
        let mut doc = ExportedServicesConfigEntry::new("default");
        doc.insert_member("svc1", ServiceConsumer::peer("p1"));

        assert!(doc.contains_member("svc1", "p1"));
        assert!(!doc.contains_member("svc1", "p2"));
        assert!(!doc.contains_member("svc2", "p1"));
    }

    #[test]
    fn test_intention_insert_appends_allow_source() {
        let mut doc = ServiceIntentionsConfigEntry::new("db");
        doc.insert_member("api", SourceIntention::allow("api", None));
        doc.insert_member("api", SourceIntention::allow("api", Some("dc2")));

        assert_eq!(doc.sources.len(), 2);
        assert_eq!(doc.sources[0].action, Some(IntentionAction::Allow));
        assert_eq!(doc.sources[0].precedence, 9);
        assert_eq!(doc.sources[1].peer.as_deref(), Some("dc2"));
    }

    #[test]
    fn test_intention_remove_with_peer() {
        let mut doc = ServiceIntentionsConfigEntry::new("db");
        doc.insert_member("api", SourceIntention::allow("api", None));
        doc.insert_member("api", SourceIntention::allow("api", Some("dc2")));

        doc.remove_member("api", Some("dc2"));

        assert_eq!(doc.sources.len(), 1);
        assert!(doc.sources[0].peer.is_none());
    }

    #[test]
    fn test_intention_remove_without_peer_takes_first_by_name() {
        let mut doc = ServiceIntentionsConfigEntry::new("db");
        doc.insert_member("api", SourceIntention::allow("api", Some("dc2")));
        doc.insert_member("api", SourceIntention::allow("api", None));

        doc.remove_member("api", None);

        assert_eq!(doc.sources.len(), 1);
        assert!(doc.sources[0].peer.is_none());
    }

    #[test]
    fn test_intention_remove_last_source_empties_document() {
        let mut doc = ServiceIntentionsConfigEntry::new("db");
        doc.insert_member("api", SourceIntention::allow("api", None));

        doc.remove_member("api", None);
        assert!(doc.is_empty());

        doc.remove_member("api", None);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_intention_insert_then_remove_restores_document() {
        let mut doc = ServiceIntentionsConfigEntry::new("db");
        doc.insert_member("api", SourceIntention::allow("api", None));
        doc.insert_member("web", SourceIntention::allow("web", Some("dc2")));
        let before = doc.clone();

        // Same name, new peer
        doc.insert_member("web", SourceIntention::allow("web", Some("dc9")));
        doc.remove_member("web", Some("dc9"));
        assert_eq!(doc, before);

        // New name, no peer
        doc.insert_member("worker", SourceIntention::allow("worker", None));
        doc.remove_member("worker", None);
        assert_eq!(doc, before);

        // New name with a peer
        doc.insert_member("batch", SourceIntention::allow("batch", Some("dc3")));
        doc.remove_member("batch", Some("dc3"));
        assert_eq!(doc, before);
    }

    #[test]
    fn test_intention_round_trip_from_empty() {
        let empty = ServiceIntentionsConfigEntry::new("db");

        let mut doc = empty.clone();
        doc.insert_member("api", SourceIntention::allow("api", Some("dc2")));
        doc.remove_member("api", Some("dc2"));
        assert_eq!(doc, empty);
        assert!(doc.is_empty());

        doc.insert_member("api", SourceIntention::allow("api", None));
        doc.remove_member("api", None);
        assert_eq!(doc, empty);
    }

    #[test]
    fn test_intention_contains_member() {
        let mut doc = ServiceIntentionsConfigEntry::new("db");
        doc.insert_member("api", SourceIntention::allow("api", Some("dc2")));

        assert!(doc.contains_member("api", None));
        assert!(doc.contains_member("api", Some("dc2")));
        assert!(!doc.contains_member("api", Some("dc3")));
        assert!(!doc.contains_member("web", None));
    }
}
