//! MMDB fixture writer shared by integration tests, benches and fuzz seeds
//!
//! Builds small but structurally complete databases: a search tree with
//! 24, 28 or 32-bit records, the 16-byte separator, a data section and the
//! metadata trailer.
#![allow(dead_code)]

use ipsearch::DataValue;
use std::net::IpAddr;

pub const METADATA_MARKER: &[u8] = b"\xAB\xCD\xEFMaxMind.com";

// ---------------------------------------------------------------------------
// Data section
// ---------------------------------------------------------------------------

/// Encode a value into its data section bytes
pub fn encode(value: &DataValue) -> Vec<u8> {
    let mut out = Vec::new();
    encode_to(value, &mut out);
    out
}

/// Control byte(s) plus size extension for `type_id` and `size`
pub fn encode_control(type_id: u8, size: usize, out: &mut Vec<u8>) {
    let (size_bits, extra) = if size < 29 {
        (size as u8, Vec::new())
    } else if size < 285 {
        (29, vec![(size - 29) as u8])
    } else if size < 65_821 {
        (30, ((size - 285) as u16).to_be_bytes().to_vec())
    } else {
        (31, ((size - 65_821) as u32).to_be_bytes()[1..].to_vec())
    };

    if type_id <= 7 {
        out.push(type_id << 5 | size_bits);
    } else {
        out.push(size_bits);
        out.push(type_id - 7);
    }
    out.extend(extra);
}

fn encode_uint(type_id: u8, bytes: &[u8], out: &mut Vec<u8>) {
    let first = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    let payload = &bytes[first..];
    encode_control(type_id, payload.len(), out);
    out.extend_from_slice(payload);
}

fn encode_to(value: &DataValue, out: &mut Vec<u8>) {
    match value {
        DataValue::String(s) => {
            encode_control(2, s.len(), out);
            out.extend_from_slice(s.as_bytes());
        }
        DataValue::Double(d) => {
            encode_control(3, 8, out);
            out.extend_from_slice(&d.to_be_bytes());
        }
        DataValue::Bytes(b) => {
            encode_control(4, b.len(), out);
            out.extend_from_slice(b);
        }
        DataValue::Uint16(n) => encode_uint(5, &n.to_be_bytes(), out),
        DataValue::Uint32(n) => encode_uint(6, &n.to_be_bytes(), out),
        DataValue::Map(entries) => {
            encode_control(7, entries.len(), out);
            for (key, value) in entries {
                encode_to(&DataValue::String(key.clone()), out);
                encode_to(value, out);
            }
        }
        DataValue::Int32(n) => {
            encode_control(8, 4, out);
            out.extend_from_slice(&n.to_be_bytes());
        }
        DataValue::Uint64(n) => encode_uint(9, &n.to_be_bytes(), out),
        DataValue::Uint128(n) => encode_uint(10, &n.to_be_bytes(), out),
        DataValue::Array(items) => {
            encode_control(11, items.len(), out);
            for item in items {
                encode_to(item, out);
            }
        }
        DataValue::Bool(b) => encode_control(14, *b as usize, out),
        DataValue::Float(f) => {
            encode_control(15, 4, out);
            out.extend_from_slice(&f.to_be_bytes());
        }
    }
}

/// Smallest pointer encoding that reaches `target`
pub fn encode_pointer(target: u32) -> Vec<u8> {
    let t = target as usize;
    if t < 2048 {
        vec![0x20 | (t >> 8) as u8 & 0x7, t as u8]
    } else if t < 2048 + (1 << 19) {
        let v = t - 2048;
        vec![0x20 | 1 << 3 | (v >> 16) as u8 & 0x7, (v >> 8) as u8, v as u8]
    } else if t < 526_336 + (1 << 27) {
        let v = t - 526_336;
        vec![
            0x20 | 2 << 3 | (v >> 24) as u8 & 0x7,
            (v >> 16) as u8,
            (v >> 8) as u8,
            v as u8,
        ]
    } else {
        let mut out = vec![0x20 | 3 << 3];
        out.extend_from_slice(&target.to_be_bytes());
        out
    }
}

/// Append-only data section writer
#[derive(Default)]
pub struct DataWriter {
    buffer: Vec<u8>,
}

impl DataWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value, returning its offset
    pub fn write(&mut self, value: &DataValue) -> u32 {
        let offset = self.buffer.len() as u32;
        encode_to(value, &mut self.buffer);
        offset
    }

    /// Append a pointer to `target`, returning the pointer's own offset
    pub fn write_pointer(&mut self, target: u32) -> u32 {
        self.write_raw(&encode_pointer(target))
    }

    /// Append raw bytes, returning their offset
    pub fn write_raw(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.buffer.len() as u32;
        self.buffer.extend_from_slice(bytes);
        offset
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }
}

// ---------------------------------------------------------------------------
// Search tree
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum Record {
    Empty,
    Node(u32),
    Data(u32),
}

/// Binary trie over network prefixes
pub struct TreeWriter {
    ip_version: u16,
    nodes: Vec<[Record; 2]>,
}

impl TreeWriter {
    pub fn new(ip_version: u16) -> Self {
        Self {
            ip_version,
            nodes: vec![[Record::Empty, Record::Empty]],
        }
    }

    /// Map `cidr` (e.g. `203.0.113.0/24`) to the data at `data_offset`
    ///
    /// IPv4 networks in an IPv6 tree are stored under ::/96. Insert broader
    /// networks before narrower ones.
    pub fn insert(&mut self, cidr: &str, data_offset: u32) {
        let (addr, prefix) = match cidr.split_once('/') {
            Some((a, p)) => (a, p.parse::<u8>().expect("prefix length")),
            None => (cidr, if cidr.contains(':') { 128 } else { 32 }),
        };
        let addr: IpAddr = addr.parse().expect("network address");

        let (bits, width, prefix) = match (addr, self.ip_version) {
            (IpAddr::V4(v4), 4) => (u32::from(v4) as u128, 32u8, prefix),
            (IpAddr::V4(v4), _) => (u32::from(v4) as u128, 128u8, prefix + 96),
            (IpAddr::V6(v6), 6) => (u128::from(v6), 128u8, prefix),
            (IpAddr::V6(_), _) => panic!("IPv6 network {} in an IPv4 tree", cidr),
        };
        assert!(prefix > 0 && prefix <= width);

        let mut node = 0usize;
        for depth in 0..prefix {
            let bit = ((bits >> (width - 1 - depth)) & 1) as usize;
            if depth == prefix - 1 {
                self.nodes[node][bit] = Record::Data(data_offset);
                break;
            }
            node = match self.nodes[node][bit] {
                Record::Node(next) => next as usize,
                existing => {
                    // Split an existing network (or empty space) in two
                    let next = self.nodes.len();
                    self.nodes.push([existing, existing]);
                    self.nodes[node][bit] = Record::Node(next as u32);
                    next
                }
            };
        }
    }

    pub fn node_count(&self) -> u32 {
        self.nodes.len() as u32
    }

    /// Serialize with the given record size
    pub fn to_bytes(&self, record_size: u16) -> Vec<u8> {
        let node_count = self.node_count();
        let value = |r: Record| match r {
            Record::Empty => node_count,
            Record::Node(n) => n,
            Record::Data(offset) => node_count + 16 + offset,
        };

        let mut out = Vec::new();
        for [left, right] in &self.nodes {
            pack_node(record_size, value(*left), value(*right), &mut out);
        }
        out
    }
}

/// Pack one node's records
pub fn pack_node(record_size: u16, left: u32, right: u32, out: &mut Vec<u8>) {
    match record_size {
        24 => {
            out.extend_from_slice(&left.to_be_bytes()[1..]);
            out.extend_from_slice(&right.to_be_bytes()[1..]);
        }
        28 => {
            out.extend_from_slice(&left.to_be_bytes()[1..]);
            out.push((((left >> 24) & 0x0F) << 4 | ((right >> 24) & 0x0F)) as u8);
            out.extend_from_slice(&right.to_be_bytes()[1..]);
        }
        32 => {
            out.extend_from_slice(&left.to_be_bytes());
            out.extend_from_slice(&right.to_be_bytes());
        }
        other => panic!("unsupported record size {}", other),
    }
}

// ---------------------------------------------------------------------------
// Whole database
// ---------------------------------------------------------------------------

pub struct MmdbBuilder {
    ip_version: u16,
    record_size: u16,
    major_version: u16,
    database_type: String,
    build_epoch: u64,
    tree: TreeWriter,
    data: DataWriter,
}

impl MmdbBuilder {
    pub fn new(ip_version: u16, record_size: u16) -> Self {
        Self {
            ip_version,
            record_size,
            major_version: 2,
            database_type: "ipsearch-test".to_string(),
            build_epoch: 1_700_000_000,
            tree: TreeWriter::new(ip_version),
            data: DataWriter::new(),
        }
    }

    pub fn database_type(mut self, name: &str) -> Self {
        self.database_type = name.to_string();
        self
    }

    pub fn major_version(mut self, version: u16) -> Self {
        self.major_version = version;
        self
    }

    /// Write `value` to the data section and map `cidr` to it
    pub fn insert(&mut self, cidr: &str, value: &DataValue) -> u32 {
        let offset = self.data.write(value);
        self.tree.insert(cidr, offset);
        offset
    }

    /// Map `cidr` to an offset already written through [`data`](Self::data)
    pub fn insert_offset(&mut self, cidr: &str, offset: u32) {
        self.tree.insert(cidr, offset);
    }

    pub fn data(&mut self) -> &mut DataWriter {
        &mut self.data
    }

    pub fn metadata(&self) -> DataValue {
        map(vec![
            ("node_count", DataValue::Uint32(self.tree.node_count())),
            ("record_size", DataValue::Uint16(self.record_size)),
            ("ip_version", DataValue::Uint16(self.ip_version)),
            ("binary_format_major_version", DataValue::Uint16(self.major_version)),
            ("binary_format_minor_version", DataValue::Uint16(0)),
            ("build_epoch", DataValue::Uint64(self.build_epoch)),
            ("database_type", s(&self.database_type)),
            ("languages", DataValue::Array(vec![s("en")])),
            ("description", map(vec![("en", s("ipsearch test fixture"))])),
        ])
    }

    pub fn build(&self) -> Vec<u8> {
        let mut file = self.tree.to_bytes(self.record_size);
        file.extend_from_slice(&[0u8; 16]);
        file.extend_from_slice(self.data.bytes());
        file.extend_from_slice(METADATA_MARKER);
        file.extend(encode(&self.metadata()));
        file
    }
}

// ---------------------------------------------------------------------------
// Values and canned fixtures
// ---------------------------------------------------------------------------

pub fn s(text: &str) -> DataValue {
    DataValue::String(text.to_string())
}

pub fn map(entries: Vec<(&str, DataValue)>) -> DataValue {
    DataValue::Map(
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    )
}

/// A GeoLite2-City shaped record
pub fn city_record(iso_code: &str, name: &str, lon: f64, lat: f64, time_zone: &str) -> DataValue {
    map(vec![
        (
            "country",
            map(vec![
                ("geoname_id", DataValue::Uint32(6_252_001)),
                ("iso_code", s(iso_code)),
                ("names", map(vec![("de", s(name)), ("en", s(name))])),
            ]),
        ),
        (
            "location",
            map(vec![
                ("accuracy_radius", DataValue::Uint16(1000)),
                ("latitude", DataValue::Double(lat)),
                ("longitude", DataValue::Double(lon)),
                ("time_zone", s(time_zone)),
            ]),
        ),
    ])
}

/// A GeoLite2-ASN shaped record
pub fn asn_record(asn: u32, organization: &str) -> DataValue {
    map(vec![
        ("autonomous_system_number", DataValue::Uint32(asn)),
        ("autonomous_system_organization", s(organization)),
    ])
}

/// Dual-stack city database:
/// - 203.0.113.0/24 -> US (-97.0, 38.0)
/// - 192.0.2.0/24   -> FR
/// - 2001:db8::/32  -> DE
pub fn city_db(record_size: u16) -> Vec<u8> {
    let mut builder = MmdbBuilder::new(6, record_size).database_type("GeoLite2-City");
    builder.insert(
        "203.0.113.0/24",
        &city_record("US", "United States", -97.0, 38.0, "America/Chicago"),
    );
    builder.insert(
        "192.0.2.0/24",
        &city_record("FR", "France", 2.3387, 48.8582, "Europe/Paris"),
    );
    builder.insert(
        "2001:db8::/32",
        &city_record("DE", "Germany", 9.491, 51.2993, "Europe/Berlin"),
    );
    builder.build()
}

/// IPv4-only ASN database:
/// - 203.0.113.0/24 -> AS64496 "Example Networks"
/// - 203.0.113.128/25 -> AS64511 "Example Subnet"
pub fn asn_db(record_size: u16) -> Vec<u8> {
    let mut builder = MmdbBuilder::new(4, record_size).database_type("GeoLite2-ASN");
    builder.insert("203.0.113.0/24", &asn_record(64496, "Example Networks"));
    builder.insert("203.0.113.128/25", &asn_record(64511, "Example Subnet"));
    builder.build()
}
