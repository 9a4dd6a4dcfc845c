//! DNS response code definitions

use std::fmt;

/// The result code of a DNS response (RFC 1035 section 4.1.1)
///
/// Codes outside the range this crate names collapse into `RcNotSet`, which
/// is also what an absent or unreadable response reports.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ResultCode {
    NOERROR,
    FORMERR,
    SERVFAIL,
    NXDOMAIN,
    NOTIMP,
    REFUSED,
    YXDOMAIN,
    YXRRSET,
    NXRRSET,
    NOTAUTH,
    #[default]
    RcNotSet,
}

impl ResultCode {
    pub fn from_num(num: u8) -> ResultCode {
        match num {
            0 => ResultCode::NOERROR,
            1 => ResultCode::FORMERR,
            2 => ResultCode::SERVFAIL,
            3 => ResultCode::NXDOMAIN,
            4 => ResultCode::NOTIMP,
            5 => ResultCode::REFUSED,
            6 => ResultCode::YXDOMAIN,
            7 => ResultCode::YXRRSET,
            8 => ResultCode::NXRRSET,
            9 => ResultCode::NOTAUTH,
            _ => ResultCode::RcNotSet,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            ResultCode::NOERROR => "NOERROR",
            ResultCode::FORMERR => "FORMERR",
            ResultCode::SERVFAIL => "SERVFAIL",
            ResultCode::NXDOMAIN => "NXDOMAIN",
            ResultCode::NOTIMP => "NOTIMP",
            ResultCode::REFUSED => "REFUSED",
            ResultCode::YXDOMAIN => "YXDOMAIN",
            ResultCode::YXRRSET => "YXRRSET",
            ResultCode::NXRRSET => "NXRRSET",
            ResultCode::NOTAUTH => "NOTAUTH",
            ResultCode::RcNotSet => "rcNotSet",
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
