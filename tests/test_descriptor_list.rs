use fixtures::*;

use pretty_assertions::assert_eq;
use sidesc::descriptors::{
    EACEM_PDS, NetworkNameDescriptor, PrivateDataSpecifierDescriptor, ServiceDescriptor,
    StreamIdentifierDescriptor, SupplementaryAudioDescriptor,
};
use sidesc::{Context, Descriptor, DescriptorList, TypedDescriptor};

#[test]
fn add_mode_appends_every_occurrence() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let mut list = DescriptorList::new();
    assert!(list.add(&ctx, &PrivateDataSpecifierDescriptor::new(1)));
    assert!(list.add(&ctx, &PrivateDataSpecifierDescriptor::new(2)));
    assert_eq!(list.len(), 2);
}

#[test]
fn ignore_mode_keeps_only_the_first_occurrence() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let mut list = DescriptorList::new();
    assert!(list.add(&ctx, &StreamIdentifierDescriptor::new(0x01)));
    assert!(list.add(&ctx, &StreamIdentifierDescriptor::new(0x02)));

    assert_eq!(list.len(), 1);
    assert_eq!(list.get(0).unwrap().payload(), &[0x01]);
}

#[test]
fn replace_mode_overwrites_in_place() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let mut list = DescriptorList::new();
    list.add(&ctx, &StreamIdentifierDescriptor::new(0x07));
    list.add(&ctx, &NetworkNameDescriptor::new("Old Name"));
    list.add(&ctx, &ServiceDescriptor::new(0x01, "P", "S"));
    list.add(&ctx, &NetworkNameDescriptor::new("New Name"));

    assert_eq!(list.len(), 3);
    assert_eq!(list.get(1).unwrap().payload(), b"New Name");
    assert_eq!(list.get(2).unwrap().tag(), 0x48);
}

#[test]
fn merge_replaces_matching_languages_and_appends_the_rest() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let mut list = DescriptorList::new();
    list.add(&ctx, &iso639(&[("eng", 0x01)]));
    list.add(&ctx, &iso639(&[("eng", 0x03), ("fre", 0x00)]));

    assert_eq!(list.len(), 1);
    let merged = list.decode_at(&ctx, 0).unwrap();
    let langs = merged.languages();
    assert_eq!(langs.len(), 2);
    assert!(langs[0].matches_ignore_case("eng"));
    assert!(langs[1].matches_ignore_case("fre"));
    // The eng entry took the incoming audio type.
    assert_eq!(list.get(0).unwrap().payload(), b"eng\x03fre\x00");
}

#[test]
fn merge_keeps_the_original_position() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let mut list = DescriptorList::new();
    list.add(&ctx, &iso639(&[("eng", 0x00)]));
    list.add(&ctx, &StreamIdentifierDescriptor::new(0x07));
    list.add(&ctx, &iso639(&[("deu", 0x00)]));

    assert_eq!(list.len(), 2);
    assert_eq!(list.get(0).unwrap().tag(), 0x0A);
    assert_eq!(list.get(0).unwrap().payload(), b"eng\x00deu\x00");
    assert_eq!(list.get(1).unwrap().tag(), 0x52);
}

#[test]
fn merge_is_idempotent_through_the_list() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let mut list = DescriptorList::new();
    list.add(&ctx, &iso639(&[("eng", 0x00), ("fre", 0x03)]));
    let before = list.clone();
    list.add(&ctx, &iso639(&[("eng", 0x00), ("fre", 0x03)]));
    assert_eq!(list, before);
}

#[test]
fn extension_descriptors_merge_behind_the_tag_extension() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let mut list = DescriptorList::new();
    list.add(&ctx, &SupplementaryAudioDescriptor::new(1, 0x02));
    list.add(
        &ctx,
        &SupplementaryAudioDescriptor::new(0, 0x1F).with_language("eng".parse().unwrap()),
    );

    assert_eq!(list.len(), 1);
    let entry = list.get(0).unwrap();
    assert_eq!(entry.tag(), 0x7F);
    assert_eq!(entry.payload()[0], 0x06);
    // Existing scalars kept, unset language filled from the newcomer.
    let merged = list.decode_at(&ctx, 0).unwrap();
    assert!(merged.languages()[0].matches_ignore_case("eng"));
    assert_eq!(entry.payload()[1] >> 7, 1); // mix_type of the original entry
}

#[test]
fn merge_falls_back_to_append_when_the_existing_entry_is_undecodable() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let mut list = DescriptorList::new();
    // Same resolved identity as ISO_639, but not a whole number of entries.
    list.push(Descriptor::from_tag_payload(0x0A, &[0x01, 0x02]));
    list.add(&ctx, &iso639(&[("eng", 0x00)]));

    assert_eq!(list.len(), 2);
    assert_eq!(list.get(1).unwrap().payload(), b"eng\x00");
}

#[test]
fn vendor_descriptors_pull_their_specifier_into_scope() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let mut list = DescriptorList::new();
    list.add(&ctx, &lcn(&[(0x0001, true, 1)]));

    // The specifier was inserted ahead of the private descriptor.
    assert_eq!(list.len(), 2);
    assert_eq!(list.get(0).unwrap().tag(), 0x5F);
    assert_eq!(list.get(0).unwrap().payload(), &[0x00, 0x00, 0x00, 0x28]);
    assert_eq!(list.pds_at(1), Some(EACEM_PDS));

    // The scope is already established for the next one.
    list.add(&ctx, &lcn(&[(0x0002, true, 2)]));
    assert_eq!(list.len(), 3);
}

#[test]
fn language_search_is_case_insensitive_over_unrelated_layouts() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let mut list = DescriptorList::new();
    list.push(descriptor_of(&ctx, &iso639(&[("foo", 0x00), ("bar", 0x00)])));
    list.push(descriptor_of(
        &ctx,
        &sidesc::descriptors::ComponentDescriptor::new(0x01, 0x01, 0x00, "fre".parse().unwrap(), ""),
    ));

    assert_eq!(list.search_language(&ctx, "FRE"), Some(1));
    assert_eq!(list.search_language(&ctx, "bar"), Some(0));
    assert_eq!(list.search_language(&ctx, "xyz"), None);
}

#[test]
fn all_languages_concatenates_in_list_order_and_caps() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let mut list = DescriptorList::new();
    list.push(descriptor_of(&ctx, &iso639(&[("eng", 0x00), ("fre", 0x00)])));
    list.push(descriptor_of(
        &ctx,
        &SupplementaryAudioDescriptor::new(0, 0).with_language("deu".parse().unwrap()),
    ));
    // An undecodable entry contributes nothing.
    list.push(Descriptor::from_tag_payload(0x48, &[0xFF]));

    let all: Vec<String> = list
        .all_languages(&ctx, None)
        .iter()
        .map(|c| c.as_str())
        .collect();
    assert_eq!(all, vec!["eng", "fre", "deu"]);

    assert_eq!(list.all_languages(&ctx, Some(2)).len(), 2);
}

#[test]
fn table_scoped_lists_resolve_their_own_tags() {
    ensure_env_logger_initialized();
    use sidesc::descriptors::{AIT_TABLE_ID, ApplicationName, ApplicationNameDescriptor};

    let ctx = Context::default();
    let mut list = DescriptorList::for_table(AIT_TABLE_ID);
    list.add(
        &ctx,
        &ApplicationNameDescriptor::new(vec![ApplicationName {
            language: "eng".parse().unwrap(),
            name: "Guide".to_string(),
        }]),
    );

    let typed = list.decode_at(&ctx, 0).unwrap();
    assert_eq!(typed.xml_name(), "application_name_descriptor");

    // The same bytes in an unscoped list mean nothing.
    let mut elsewhere = DescriptorList::new();
    elsewhere.push(list.get(0).unwrap().clone());
    let opaque = elsewhere.decode_at(&ctx, 0).unwrap();
    assert_eq!(opaque.xml_name(), "unknown_descriptor");
}

fn descriptor_of(ctx: &Context<'_>, typed: &dyn TypedDescriptor) -> Descriptor {
    let desc = Descriptor::from_typed(typed, ctx);
    assert!(desc.is_valid());
    desc
}

#[test]
fn the_same_tag_means_different_things_in_different_scopes() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let mut list = DescriptorList::new();
    // A raw 0x83 outside any vendor scope is not an LCN descriptor.
    list.push(Descriptor::from_tag_payload(0x83, &[0xAA, 0xBB, 0xCC, 0xDD]));
    list.add(&ctx, &lcn(&[(0x0001, true, 1)]));

    assert_eq!(list.len(), 3);
    assert_eq!(list.get(1).unwrap().tag(), 0x5F);
    assert_eq!(list.decode_at(&ctx, 0).unwrap().xml_name(), "unknown_descriptor");
    assert_eq!(
        list.decode_at(&ctx, 2).unwrap().xml_name(),
        "logical_channel_number_descriptor"
    );
}
