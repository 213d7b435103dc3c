pub mod delete_draft;
pub mod get_document;
pub mod get_verification_payload;
pub mod issue_document;
pub mod submit_invoice;
pub mod submit_pending;
pub mod update_draft;
pub mod verify_chain;

pub use delete_draft::{DeleteDraftCommand, DeleteDraftUseCase};
pub use get_document::{
  DocumentDetailsResponse, DocumentLineDto, DocumentTotalsDto, GetDocumentCommand,
  GetDocumentUseCase, IntegritySealDto,
};
pub use get_verification_payload::{
  GetVerificationPayloadCommand, GetVerificationPayloadUseCase, VerificationPayloadResponse,
};
pub use issue_document::{DocumentLineInputDto, IssueDocumentCommand, IssueDocumentUseCase};
pub use submit_invoice::{SubmitInvoiceCommand, SubmitInvoiceResponse, SubmitInvoiceUseCase};
pub use submit_pending::{SubmitPendingCommand, SubmitPendingResponse, SubmitPendingUseCase};
pub use update_draft::{UpdateDraftCommand, UpdateDraftUseCase};
pub use verify_chain::{VerifyChainCommand, VerifyChainResponse, VerifyChainUseCase};
