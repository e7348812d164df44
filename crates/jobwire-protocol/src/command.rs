/// Direction marker carried in the first four header bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Magic {
    Request,
    Response,
}

impl Magic {
    pub const REQUEST_BYTES: [u8; 4] = *b"\0REQ";
    pub const RESPONSE_BYTES: [u8; 4] = *b"\0RES";

    pub fn as_bytes(&self) -> [u8; 4] {
        match self {
            Magic::Request => Self::REQUEST_BYTES,
            Magic::Response => Self::RESPONSE_BYTES,
        }
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Option<Self> {
        match bytes {
            Self::REQUEST_BYTES => Some(Magic::Request),
            Self::RESPONSE_BYTES => Some(Magic::Response),
            _ => None,
        }
    }
}

/// Request-direction command codes.
///
/// Codes are only meaningful together with the magic and the role that
/// interprets them: the worker and client vocabularies overlap numerically
/// (echo-req and option-req are shared, the rest are role-specific). The
/// numeric values are fixed by the deployed job-server implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Request {
    CanDo = 1,
    CantDo = 2,
    ResetAbilities = 3,
    PreSleep = 4,
    SubmitJob = 7,
    GrabJob = 9,
    WorkStatus = 12,
    WorkComplete = 13,
    WorkFail = 14,
    GetStatus = 15,
    EchoReq = 16,
    SubmitJobBg = 18,
    SubmitJobHigh = 21,
    SetClientId = 22,
    CanDoTimeout = 23,
    AllYours = 24,
    WorkException = 25,
    OptionReq = 26,
    WorkData = 28,
    WorkWarning = 29,
    GrabJobUniq = 30,
    SubmitJobHighBg = 32,
    SubmitJobLow = 33,
    SubmitJobLowBg = 34,
    SubmitJobSched = 35,
    SubmitJobEpoch = 36,
}

impl Request {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            1 => Some(Request::CanDo),
            2 => Some(Request::CantDo),
            3 => Some(Request::ResetAbilities),
            4 => Some(Request::PreSleep),
            7 => Some(Request::SubmitJob),
            9 => Some(Request::GrabJob),
            12 => Some(Request::WorkStatus),
            13 => Some(Request::WorkComplete),
            14 => Some(Request::WorkFail),
            15 => Some(Request::GetStatus),
            16 => Some(Request::EchoReq),
            18 => Some(Request::SubmitJobBg),
            21 => Some(Request::SubmitJobHigh),
            22 => Some(Request::SetClientId),
            23 => Some(Request::CanDoTimeout),
            24 => Some(Request::AllYours),
            25 => Some(Request::WorkException),
            26 => Some(Request::OptionReq),
            28 => Some(Request::WorkData),
            29 => Some(Request::WorkWarning),
            30 => Some(Request::GrabJobUniq),
            32 => Some(Request::SubmitJobHighBg),
            33 => Some(Request::SubmitJobLow),
            34 => Some(Request::SubmitJobLowBg),
            35 => Some(Request::SubmitJobSched),
            36 => Some(Request::SubmitJobEpoch),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> u32 {
        *self as u32
    }
}

/// Response-direction command codes the server sends back to either role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Response {
    Noop = 6,
    JobCreated = 8,
    NoJob = 10,
    JobAssign = 11,
    EchoRes = 17,
    Error = 19,
    StatusRes = 20,
    OptionRes = 27,
    JobAssignUniq = 31,
}

impl Response {
    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            6 => Some(Response::Noop),
            8 => Some(Response::JobCreated),
            10 => Some(Response::NoJob),
            11 => Some(Response::JobAssign),
            17 => Some(Response::EchoRes),
            19 => Some(Response::Error),
            20 => Some(Response::StatusRes),
            27 => Some(Response::OptionRes),
            31 => Some(Response::JobAssignUniq),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> u32 {
        *self as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_code_conversion() {
        assert_eq!(Request::from_u32(1), Some(Request::CanDo));
        assert_eq!(Request::from_u32(30), Some(Request::GrabJobUniq));
        assert_eq!(Request::from_u32(36), Some(Request::SubmitJobEpoch));
        assert_eq!(Request::from_u32(99), None);

        assert_eq!(Request::CanDo.as_u32(), 1);
        assert_eq!(Request::SubmitJobSched.as_u32(), 35);
    }

    #[test]
    fn test_response_code_conversion() {
        assert_eq!(Response::from_u32(6), Some(Response::Noop));
        assert_eq!(Response::from_u32(31), Some(Response::JobAssignUniq));
        assert_eq!(Response::from_u32(5), None);

        assert_eq!(Response::JobCreated.as_u32(), 8);
        assert_eq!(Response::Error.as_u32(), 19);
    }

    #[test]
    fn test_magic_bytes() {
        assert_eq!(Magic::Request.as_bytes(), [0, b'R', b'E', b'Q']);
        assert_eq!(Magic::Response.as_bytes(), [0, b'R', b'E', b'S']);
        assert_eq!(Magic::from_bytes(*b"\0RES"), Some(Magic::Response));
        assert_eq!(Magic::from_bytes(*b"\0XXX"), None);
    }
}
