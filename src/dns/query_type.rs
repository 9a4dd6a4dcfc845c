//! DNS record type definitions and conversions

/// `QueryType` represents the Record Type of a question or resource record
///
/// The specific type Unknown carries an integer parameter in order to retain
/// the id of a type this crate does not name. An integer can be converted to
/// a querytype using the `from_num` function, and back to an integer using
/// the `to_num` method.
#[derive(PartialEq, Eq, Debug, Clone, Hash, Copy)]
pub enum QueryType {
    Unknown(u16),
    A,          // 1
    Ns,         // 2
    Cname,      // 5
    Soa,        // 6
    Mx,         // 15
    Txt,        // 16
    Aaaa,       // 28
    Srv,        // 33
    Opt,        // 41
    Ds,         // 43
    Rrsig,      // 46
    Nsec,       // 47
    Dnskey,     // 48
    Nsec3,      // 50
    Nsec3Param, // 51
    Any,        // 255
}

impl QueryType {
    pub fn to_num(&self) -> u16 {
        match *self {
            QueryType::Unknown(x) => x,
            QueryType::A => 1,
            QueryType::Ns => 2,
            QueryType::Cname => 5,
            QueryType::Soa => 6,
            QueryType::Mx => 15,
            QueryType::Txt => 16,
            QueryType::Aaaa => 28,
            QueryType::Srv => 33,
            QueryType::Opt => 41,
            QueryType::Ds => 43,
            QueryType::Rrsig => 46,
            QueryType::Nsec => 47,
            QueryType::Dnskey => 48,
            QueryType::Nsec3 => 50,
            QueryType::Nsec3Param => 51,
            QueryType::Any => 255,
        }
    }

    pub fn from_num(num: u16) -> QueryType {
        match num {
            1 => QueryType::A,
            2 => QueryType::Ns,
            5 => QueryType::Cname,
            6 => QueryType::Soa,
            15 => QueryType::Mx,
            16 => QueryType::Txt,
            28 => QueryType::Aaaa,
            33 => QueryType::Srv,
            41 => QueryType::Opt,
            43 => QueryType::Ds,
            46 => QueryType::Rrsig,
            47 => QueryType::Nsec,
            48 => QueryType::Dnskey,
            50 => QueryType::Nsec3,
            51 => QueryType::Nsec3Param,
            255 => QueryType::Any,
            _ => QueryType::Unknown(num),
        }
    }

    /// RRSIG, DNSKEY, DS, NSEC, NSEC3 and NSEC3PARAM
    pub fn is_dnssec(&self) -> bool {
        matches!(
            *self,
            QueryType::Ds
                | QueryType::Rrsig
                | QueryType::Nsec
                | QueryType::Dnskey
                | QueryType::Nsec3
                | QueryType::Nsec3Param
        )
    }

    /// Types an authority section may legitimately carry
    pub fn is_valid_in_authority(&self) -> bool {
        matches!(*self, QueryType::Ns | QueryType::Soa) || self.is_dnssec()
    }

    /// Coarse label reported as `q_type`. Every DNSSEC type collapses into
    /// `DNSSEC`; types without a label become `OTHER`.
    pub fn predicate_label(&self) -> &'static str {
        if self.is_dnssec() {
            return "DNSSEC";
        }

        match *self {
            QueryType::A => "A",
            QueryType::Aaaa => "AAAA",
            QueryType::Cname => "CNAME",
            QueryType::Ns => "NS",
            QueryType::Mx => "MX",
            QueryType::Txt => "TXT",
            QueryType::Opt => "OPT",
            QueryType::Any => "ANY",
            _ => "OTHER",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_num_conversion() {
        for num in [1u16, 2, 5, 6, 15, 16, 28, 33, 41, 43, 46, 47, 48, 50, 51, 255] {
            assert_eq!(QueryType::from_num(num).to_num(), num);
        }
        assert_eq!(QueryType::from_num(99), QueryType::Unknown(99));
        assert_eq!(QueryType::Unknown(99).to_num(), 99);
    }

    #[test]
    fn test_predicate_labels() {
        assert_eq!(QueryType::A.predicate_label(), "A");
        assert_eq!(QueryType::Any.predicate_label(), "ANY");
        assert_eq!(QueryType::Nsec3Param.predicate_label(), "DNSSEC");
        assert_eq!(QueryType::Soa.predicate_label(), "OTHER");
        assert_eq!(QueryType::Unknown(65).predicate_label(), "OTHER");
    }

    #[test]
    fn test_authority_whitelist() {
        assert!(QueryType::Ns.is_valid_in_authority());
        assert!(QueryType::Soa.is_valid_in_authority());
        assert!(QueryType::Rrsig.is_valid_in_authority());
        assert!(!QueryType::A.is_valid_in_authority());
        assert!(!QueryType::Cname.is_valid_in_authority());
        assert!(!QueryType::Opt.is_valid_in_authority());
    }
}
