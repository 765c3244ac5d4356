//! F1 Application Protocol (3GPP TS 38.473)
//!
//! F1AP runs over SCTP between a gNB-CU and a gNB-DU. The PDU envelope and the protocol IE
//! container are walked with [`crate::per`]; IEs with a simple type are decoded, the RRC
//! container is handed to whatever is registered by the name `"rrc"`, and everything else is
//! kept as the encoded open type.

use serde::Serialize;

use crate::errors::{Error, Note};
use crate::layer::Layer;
use crate::per::{
    decode_protocol_ies, delegate, plmn_identity, read_cause, read_named_enumerated,
    read_protocol_ie_container, CauseGroup, Criticality, IEValue, PduKind, PerReader, ProtocolIE,
};
use crate::registry::Registry;

pub const F1AP_SCTP_PPID: u32 = 62;
pub const F1AP_SCTP_PORT: u16 = 38472;

const MAX_PROTOCOL_IES: u64 = 65535;

pub const F1AP_PROC_PRIVATE_MESSAGE: u8 = 14;

pub const ID_CAUSE: u16 = 0;
pub const ID_DU_TO_CU_RRC_CONTAINER: u16 = 39;
pub const ID_GNB_CU_UE_F1AP_ID: u16 = 40;
pub const ID_GNB_DU_UE_F1AP_ID: u16 = 41;
pub const ID_GNB_DU_ID: u16 = 42;
pub const ID_GNB_DU_NAME: u16 = 45;
pub const ID_OLD_GNB_DU_UE_F1AP_ID: u16 = 47;
pub const ID_RRC_CONTAINER: u16 = 50;
pub const ID_SRBID: u16 = 64;
pub const ID_TIME_TO_WAIT: u16 = 77;
pub const ID_TRANSACTION_ID: u16 = 78;
pub const ID_GNB_CU_NAME: u16 = 82;
pub const ID_C_RNTI: u16 = 95;
pub const ID_NRCGI: u16 = 111;

// Register ourselves with parent
pub(crate) fn register_defaults(registry: &mut Registry) -> Result<(), Error> {
    registry.sctp_ppids.register(F1AP_SCTP_PPID, F1AP::creator)?;
    registry.sctp_ports.register(F1AP_SCTP_PORT, F1AP::creator)?;
    registry.named.register("f1ap", F1AP::creator)?;

    Ok(())
}

pub fn procedure_name(code: u8) -> &'static str {
    match code {
        0 => "Reset",
        1 => "F1Setup",
        2 => "ErrorIndication",
        3 => "gNBDUConfigurationUpdate",
        4 => "gNBCUConfigurationUpdate",
        5 => "UEContextSetup",
        6 => "UEContextRelease",
        7 => "UEContextModification",
        8 => "UEContextModificationRequired",
        9 => "UEMobilityCommand",
        10 => "UEContextReleaseRequest",
        11 => "InitialULRRCMessageTransfer",
        12 => "DLRRCMessageTransfer",
        13 => "ULRRCMessageTransfer",
        F1AP_PROC_PRIVATE_MESSAGE => "privateMessage",
        15 => "UEInactivityNotification",
        16 => "GNBDUResourceCoordination",
        17 => "SystemInformationDeliveryCommand",
        18 => "Paging",
        19 => "Notify",
        20 => "WriteReplaceWarning",
        21 => "PWSCancel",
        22 => "PWSRestartIndication",
        23 => "PWSFailureIndication",
        24 => "GNBDUStatusIndication",
        25 => "RRCDeliveryReport",
        26 => "F1Removal",
        27 => "NetworkAccessRateReduction",
        _ => "Unknown",
    }
}

pub fn ie_name(id: u16) -> &'static str {
    match id {
        ID_CAUSE => "Cause",
        1 => "Cells-Failed-to-be-Activated-List",
        3 => "Cells-to-be-Activated-List",
        7 => "CriticalityDiagnostics",
        ID_DU_TO_CU_RRC_CONTAINER => "DUtoCURRCContainer",
        ID_GNB_CU_UE_F1AP_ID => "gNB-CU-UE-F1AP-ID",
        ID_GNB_DU_UE_F1AP_ID => "gNB-DU-UE-F1AP-ID",
        ID_GNB_DU_ID => "gNB-DU-ID",
        43 => "GNB-DU-Served-Cells-Item",
        44 => "gNB-DU-Served-Cells-List",
        ID_GNB_DU_NAME => "gNB-DU-Name",
        ID_OLD_GNB_DU_UE_F1AP_ID => "oldgNB-DU-UE-F1AP-ID",
        48 => "ResetType",
        ID_RRC_CONTAINER => "RRCContainer",
        ID_SRBID => "SRBID",
        ID_TIME_TO_WAIT => "TimeToWait",
        ID_TRANSACTION_ID => "TransactionID",
        ID_GNB_CU_NAME => "gNB-CU-Name",
        ID_C_RNTI => "C-RNTI",
        ID_NRCGI => "NRCGI",
        170 => "GNB-CU-RRC-Version",
        171 => "GNB-DU-RRC-Version",
        _ => "Unknown",
    }
}

const CAUSE_GROUPS: &[CauseGroup] = &[
    (
        "radioNetwork",
        &[
            "unspecified",
            "rl-failure-rlc",
            "unknown-or-already-allocated-gnb-cu-ue-f1ap-id",
            "unknown-or-already-allocated-gnb-du-ue-f1ap-id",
            "unknown-or-inconsistent-pair-of-ue-f1ap-id",
            "interaction-with-other-procedure",
            "not-supported-qci-Value",
            "action-desirable-for-radio-reasons",
            "no-radio-resources-available",
            "procedure-cancelled",
            "normal-release",
        ],
    ),
    (
        "transport",
        &["unspecified", "transport-resource-unavailable"],
    ),
    (
        "protocol",
        &[
            "transfer-syntax-error",
            "abstract-syntax-error-reject",
            "abstract-syntax-error-ignore-and-notify",
            "message-not-compatible-with-receiver-state",
            "semantic-error",
            "abstract-syntax-error-falsely-constructed-message",
            "unspecified",
        ],
    ),
    (
        "misc",
        &[
            "control-processing-overload",
            "not-enough-user-plane-processing-resources",
            "hardware-failure",
            "om-intervention",
            "unspecified",
        ],
    ),
];

const TIME_TO_WAIT: &[&str] = &["v1s", "v2s", "v5s", "v10s", "v20s", "v60s"];

/// `NRCGI ::= SEQUENCE { pLMN-Identity, nRCellIdentity BIT STRING (SIZE(36)), iE-Extensions
/// OPTIONAL, ... }`
fn nrcgi(reader: &mut PerReader) -> Result<IEValue, Error> {
    let _ = reader.read_sequence_preamble(true, 1)?;
    let plmn = plmn_identity(&reader.read_octet_string(3, Some(3), false)?)?;
    let cell_identity = reader.read_fixed_bit_string(36)?;

    Ok(IEValue::CellGlobalId {
        plmn,
        cell_identity: format!("{:09x}", cell_identity),
    })
}

fn decode_ie(
    registry: &Registry,
    id: u16,
    value: &[u8],
    notes: &mut Vec<Note>,
) -> Result<Option<IEValue>, Error> {
    let mut reader = PerReader::new(value);

    let decoded = match id {
        ID_CAUSE => read_cause(&mut reader, CAUSE_GROUPS)?,
        ID_GNB_CU_UE_F1AP_ID | ID_GNB_DU_UE_F1AP_ID | ID_OLD_GNB_DU_UE_F1AP_ID => {
            IEValue::Integer(reader.read_integer(0, 4_294_967_295, false)?)
        }
        ID_GNB_DU_ID => IEValue::Integer(reader.read_integer(0, 68_719_476_735, false)?),
        ID_GNB_DU_NAME | ID_GNB_CU_NAME => {
            IEValue::Text(reader.read_printable_string(1, Some(150), true)?)
        }
        ID_RRC_CONTAINER => {
            let container = reader.read_octet_string(0, None, false)?;
            delegate(registry, "rrc", &container, notes)
        }
        ID_DU_TO_CU_RRC_CONTAINER => IEValue::Opaque(reader.read_octet_string(0, None, false)?),
        ID_SRBID => IEValue::Integer(reader.read_integer(0, 3, true)?),
        ID_TIME_TO_WAIT => read_named_enumerated(&mut reader, TIME_TO_WAIT, true)?,
        ID_TRANSACTION_ID => IEValue::Integer(reader.read_integer(0, 255, true)?),
        ID_C_RNTI => IEValue::Integer(reader.read_integer(0, 65535, true)?),
        ID_NRCGI => nrcgi(&mut reader)?,
        1 | 3 | 7 | 43 | 44 | 48 | 170 | 171 => IEValue::Opaque(value.into()),
        _ => return Ok(None),
    };

    Ok(Some(decoded))
}

#[derive(Debug, Default, Serialize)]
pub struct F1AP {
    pdu: PduKind,
    procedure_code: u8,
    procedure_name: &'static str,
    criticality: Criticality,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    ies: Vec<ProtocolIE>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        serialize_with = "hex::serde::serialize"
    )]
    value: Vec<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    notes: Vec<Note>,
}

impl F1AP {
    pub fn creator() -> Box<dyn Layer + Send> {
        Box::<F1AP>::default()
    }

    pub fn pdu(&self) -> PduKind {
        self.pdu
    }

    pub fn procedure_code(&self) -> u8 {
        self.procedure_code
    }

    pub fn ies(&self) -> &[ProtocolIE] {
        &self.ies
    }

    pub fn ie(&self, id: u16) -> Option<&ProtocolIE> {
        self.ies.iter().find(|ie| ie.id() == id)
    }

    fn message_from_bytes(&mut self, registry: &Registry, value: &[u8]) -> Result<(), Error> {
        if self.procedure_code == F1AP_PROC_PRIVATE_MESSAGE {
            self.notes.push(Note::UnknownType(
                "private message IEs are not decoded".to_string(),
            ));
            self.value = value.into();
            return Ok(());
        }

        let mut reader = PerReader::new(value);
        let (extended, _) = reader.read_sequence_preamble(true, 0)?;
        let fields = read_protocol_ie_container(&mut reader, MAX_PROTOCOL_IES)?;
        self.ies = decode_protocol_ies(&fields, ie_name, |id, bytes, notes| {
            decode_ie(registry, id, bytes, notes)
        });

        if extended {
            self.notes.push(Note::UnknownType(
                "message extension additions".to_string(),
            ));
        }

        Ok(())
    }
}

impl Layer for F1AP {
    fn decode_bytes(
        &mut self,
        registry: &Registry,
        bytes: &[u8],
    ) -> Result<(Option<Box<dyn Layer + Send>>, usize), Error> {
        let mut reader = PerReader::new(bytes);

        self.pdu = match PduKind::from_reader(&mut reader)? {
            Some(pdu) => pdu,
            None => {
                self.notes
                    .push(Note::UnknownType("F1AP-PDU extension".to_string()));
                self.value = bytes.into();
                return Ok((None, bytes.len()));
            }
        };
        self.procedure_code = reader.read_constrained_whole_number(0, 255)? as u8;
        self.procedure_name = procedure_name(self.procedure_code);
        self.criticality = Criticality::from_reader(&mut reader)?;

        let value = reader.read_open_type()?;
        self.message_from_bytes(registry, value)?;

        Ok((None, reader.byte_offset()))
    }

    fn name(&self) -> &'static str {
        "F1AP"
    }

    fn short_name(&self) -> &'static str {
        "f1ap"
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn decode(bytes: &str) -> (F1AP, serde_json::Value) {
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode(bytes).unwrap();

        let mut f1ap = F1AP::default();
        let (next, consumed) = f1ap.decode_bytes(&registry, &bytes).unwrap();
        assert!(next.is_none());
        assert_eq!(consumed, bytes.len());

        let value = serde_json::to_value(&f1ap).unwrap();
        (f1ap, value)
    }

    #[test]
    fn f1_setup_request() {
        let (f1ap, value) = decode(concat!(
            "0001001b",
            "000003",
            "004e00020005",
            "002a0002000a",
            "002d40080280674e422d4455",
        ));
        assert_eq!(f1ap.pdu(), PduKind::InitiatingMessage);
        assert_eq!(value["procedure_name"], json!("F1Setup"));
        assert_eq!(value["criticality"], json!("reject"));
        assert_eq!(
            value["ies"],
            json!([
                {"id": 78, "name": "TransactionID", "criticality": "reject", "value": {"integer": 5}},
                {"id": 42, "name": "gNB-DU-ID", "criticality": "reject", "value": {"integer": 10}},
                {"id": 45, "name": "gNB-DU-Name", "criticality": "ignore", "value": {"text": "gNB-DU"}},
            ])
        );
    }

    #[test]
    fn f1_setup_response() {
        let (f1ap, value) = decode(concat!(
            "20010015",
            "000002",
            "004e00020005",
            "005240080280674e422d4355",
        ));
        assert_eq!(f1ap.pdu(), PduKind::SuccessfulOutcome);
        assert_eq!(value["pdu"], json!("successful_outcome"));
        assert_eq!(value["ies"][1]["value"], json!({"text": "gNB-CU"}));
    }

    #[test]
    fn f1_setup_failure_with_cause() {
        let (_, value) = decode(concat!(
            "40010013",
            "000003",
            "004e00020005",
            "0000400166",
            "004d400130",
        ));
        assert_eq!(value["pdu"], json!("unsuccessful_outcome"));
        assert_eq!(
            value["ies"][1]["value"],
            json!({"cause": {"group": "misc", "value": 3, "name": "om-intervention"}})
        );
        assert_eq!(
            value["ies"][2]["value"],
            json!({"enumerated": {"value": 3, "name": "v10s"}})
        );
    }

    #[test]
    fn rrc_container_without_rrc_dissector() {
        let (f1ap, value) = decode(concat!(
            "000c001c",
            "000004",
            "002800020001",
            "002900020002",
            "0040000120",
            "0032000403aabbcc",
        ));
        assert_eq!(value["procedure_name"], json!("DLRRCMessageTransfer"));
        assert_eq!(value["ies"][0]["value"], json!({"integer": 1}));
        assert_eq!(value["ies"][1]["value"], json!({"integer": 2}));
        assert_eq!(value["ies"][2]["value"], json!({"integer": 1}));

        let rrc = f1ap.ie(ID_RRC_CONTAINER).unwrap();
        assert!(matches!(rrc.value(), IEValue::Opaque(bytes) if bytes == &vec![0xaa, 0xbb, 0xcc]));
        assert!(matches!(rrc.notes(), [Note::UnknownType(_)]));
    }

    #[test]
    fn unknown_and_malformed_ies_do_not_stop_the_walk() {
        let (_, value) = decode(concat!(
            "0002001b",
            "000003",
            "270f00020102",
            "0028000140",
            "006f40090000f1101234567890",
        ));
        assert_eq!(value["ies"][0]["value"], json!({"opaque": "0102"}));
        assert_eq!(value["ies"][0]["notes"][0]["kind"], json!("unknown_type"));
        assert_eq!(value["ies"][1]["value"], json!({"opaque": "40"}));
        assert_eq!(value["ies"][1]["notes"][0]["kind"], json!("malformed_field"));
        assert_eq!(
            value["ies"][2]["value"],
            json!({"cell_global_id": {"plmn": "001-01", "cell_identity": "123456789"}})
        );
    }

    #[test]
    fn open_type_past_end_fails() {
        let registry = Registry::with_defaults().unwrap();
        let bytes = hex::decode("000100200000").unwrap();

        let mut f1ap = F1AP::default();
        assert!(f1ap.decode_bytes(&registry, &bytes).is_err());
    }
}
