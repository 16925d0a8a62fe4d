use fixtures::*;

use std::fmt::Debug;

use pretty_assertions::assert_eq;
use sidesc::descriptors::{
    ApplicationName, ApplicationNameDescriptor, ComponentDescriptor, NetworkNameDescriptor,
    PrivateDataSpecifierDescriptor, ServiceDescriptor, StreamIdentifierDescriptor,
    SupplementaryAudioDescriptor,
};
use sidesc::xml::{self, Element};
use sidesc::{Context, Descriptor, DescriptorList, TypedDescriptor};

fn assert_xml_round_trip<T>(original: &T)
where
    T: TypedDescriptor + Default + PartialEq + Debug,
{
    let ctx = Context::default();
    let element = original.build_xml(&ctx);
    assert_eq!(element.name(), original.xml_name());

    let mut reparsed = T::default();
    reparsed.analyze_xml(&element, &ctx).unwrap();
    assert!(reparsed.is_valid());
    assert_eq!(&reparsed, original);
}

#[test]
fn every_variant_round_trips_through_its_element() {
    ensure_env_logger_initialized();
    assert_xml_round_trip(&iso639(&[("eng", 0x00), ("fre", 0x03)]));
    assert_xml_round_trip(&NetworkNameDescriptor::new("Kabel BW"));
    assert_xml_round_trip(&ServiceDescriptor::new(0x19, "Provider", "Service HD"));
    assert_xml_round_trip(&ComponentDescriptor::new(
        0x01,
        0x11,
        0x42,
        "eng".parse().unwrap(),
        "HD video",
    ));
    assert_xml_round_trip(&StreamIdentifierDescriptor::new(0x42));
    assert_xml_round_trip(&PrivateDataSpecifierDescriptor::new(0x0000_0028));
    assert_xml_round_trip(
        &SupplementaryAudioDescriptor::new(1, 0x03)
            .with_language("eng".parse().unwrap())
            .with_private_data(vec![0xCA, 0xFE]),
    );
    assert_xml_round_trip(&lcn(&[(0x0001, true, 1), (0x0002, false, 801)]));
    assert_xml_round_trip(&ApplicationNameDescriptor::new(vec![ApplicationName {
        language: "eng".parse().unwrap(),
        name: "Teletext".to_string(),
    }]));
}

#[test]
fn a_descriptor_loop_survives_the_document_round_trip() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let mut list = DescriptorList::new();
    list.add(&ctx, &ServiceDescriptor::new(0x01, "ARD", "Das Erste"));
    list.add(&ctx, &iso639(&[("deu", 0x00)]));
    list.add(&ctx, &lcn(&[(0x0101, true, 1)])); // inserts its specifier
    // An unregistered tag rides along as opaque hex.
    list.push(Descriptor::from_tag_payload(0xE5, &[0x01, 0x02, 0x03]));

    let mut root = Element::new("descriptors");
    for element in list.to_xml(&ctx) {
        root.add_child(element);
    }
    let text = xml::write_document(&root).unwrap();

    let reparsed = xml::parse_document(&text).unwrap();
    let mut reloaded = DescriptorList::new();
    assert!(reloaded.from_xml(&ctx, reparsed.children()));
    assert_eq!(reloaded, list);
}

#[test]
fn legacy_element_names_still_load() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let text = "<descriptors>\n\
                <private_data_specifier_descriptor private_data_specifier=\"0x00000028\"/>\n\
                <eacem_logical_channel_number_descriptor>\n\
                <service service_id=\"0x0101\" logical_channel_number=\"12\"/>\n\
                </eacem_logical_channel_number_descriptor>\n\
                </descriptors>";
    let root = xml::parse_document(text).unwrap();

    let mut list = DescriptorList::new();
    assert!(list.from_xml(&ctx, root.children()));
    assert_eq!(list.len(), 2);
    assert_eq!(
        list.decode_at(&ctx, 1).unwrap().xml_name(),
        "logical_channel_number_descriptor"
    );
}

#[test]
fn an_unknown_element_name_fails_alone() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let text = "<descriptors>\n\
                <stream_identifier_descriptor component_tag=\"0x01\"/>\n\
                <made_up_descriptor foo=\"1\"/>\n\
                <stream_identifier_descriptor component_tag=\"0x02\"/>\n\
                </descriptors>";
    let root = xml::parse_document(text).unwrap();

    let mut list = DescriptorList::new();
    assert!(!list.from_xml(&ctx, root.children()));
    assert_eq!(list.len(), 2);
    assert_eq!(list.get(0).unwrap().payload(), &[0x01]);
    assert_eq!(list.get(1).unwrap().payload(), &[0x02]);
}

#[test]
fn a_schema_violation_fails_alone() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let text = "<descriptors>\n\
                <service_descriptor service_type=\"0x01\" service_provider_name=\"P\"/>\n\
                <network_name_descriptor network_name=\"Still Loads\"/>\n\
                </descriptors>";
    let root = xml::parse_document(text).unwrap();

    let mut list = DescriptorList::new();
    assert!(!list.from_xml(&ctx, root.children()));
    assert_eq!(list.len(), 1);
    assert_eq!(list.get(0).unwrap().payload(), b"Still Loads");
}

#[test]
fn out_of_range_attributes_are_rejected_with_their_bounds() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let text = "<logical_channel_number_descriptor>\n\
                <service service_id=\"1\" logical_channel_number=\"2000\"/>\n\
                </logical_channel_number_descriptor>";
    let root = xml::parse_document(text).unwrap();

    let mut desc = sidesc::descriptors::LogicalChannelNumberDescriptor::default();
    let err = desc.analyze_xml(&root, &ctx).unwrap_err();
    assert!(matches!(
        err,
        sidesc::XmlError::OutOfRange { value: 2000, max: 0x3FF, line: 2, .. }
    ));
    assert!(!desc.is_valid());
}

#[test]
fn unknown_descriptors_round_trip_as_hex() {
    ensure_env_logger_initialized();
    let ctx = Context::default();
    let text = "<descriptors><unknown_descriptor tag=\"0xE5\">DEADBEEF</unknown_descriptor></descriptors>";
    let root = xml::parse_document(text).unwrap();

    let mut list = DescriptorList::new();
    assert!(list.from_xml(&ctx, root.children()));
    assert_eq!(list.get(0).unwrap().tag(), 0xE5);
    assert_eq!(list.get(0).unwrap().payload(), &[0xDE, 0xAD, 0xBE, 0xEF]);
}
