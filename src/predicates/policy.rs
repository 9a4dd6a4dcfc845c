//! Thresholds separating normal resolver behavior from suspicious behavior

/// A well-behaved resolver follows two or three CNAMEs for one question
pub const CNAME_CHASE_THRESHOLD: u32 = 10;

/// Upstream UDP queries per resolution before the count is excessive
pub const UDP_QUERY_THRESHOLD: u32 = 5;

/// Upstream TCP queries per resolution before the count is excessive
pub const TCP_QUERY_THRESHOLD: u32 = 5;

/// EDNS buffer size recommended to avoid IP fragmentation
pub const MAX_UDP_RESPONSE_SIZE: usize = 1232;

/// Largest EDNS buffer size in common use
pub const LARGE_RESPONSE_SIZE: usize = 4096;

/// Source ports a response may legitimately come from; 0 means unknown
pub const EXPECTED_RESPONSE_PORTS: [u16; 2] = [53, 0];

pub fn excessive_cname_chase(count: u32) -> bool {
    count > CNAME_CHASE_THRESHOLD
}

pub fn excessive_udp_queries(count: u32) -> bool {
    count > UDP_QUERY_THRESHOLD
}

pub fn excessive_tcp_queries(count: u32) -> bool {
    count > TCP_QUERY_THRESHOLD
}

pub fn exceeds_udp_limit(size: usize) -> bool {
    size > MAX_UDP_RESPONSE_SIZE
}

pub fn exceeds_large_limit(size: usize) -> bool {
    size > LARGE_RESPONSE_SIZE
}

pub fn unexpected_port(port: u16) -> bool {
    !EXPECTED_RESPONSE_PORTS.contains(&port)
}
