pub mod comment;
pub mod like;
pub mod notification;
pub mod playlist;
pub mod report;
pub mod subscription;
pub mod user;
pub mod video;

pub use comment::{Comment, CommentView, CreateCommentRequest, NewComment, UpdateCommentRequest};
pub use like::{Like, LikeTarget, NewLike};
pub use notification::{NewNotification, Notification, NotificationKind, NotificationView};
pub use playlist::{
    AddPlaylistVideoRequest, CreatePlaylistRequest, NewPlaylist, Playlist, PlaylistEntry,
    PlaylistView,
};
pub use report::{CreateReportRequest, NewReport, Report, ReportStatus, ReportTarget, ReportView};
pub use subscription::{NewSubscription, Subscription};
pub use user::{
    ChangePasswordRequest, ChannelProfile, LoginRequest, NewUser, OwnerSummary, RegisterRequest,
    UpdateProfileRequest, User, UserPatch, UserView,
};
pub use video::{NewVideo, UpdateVideoRequest, Video, VideoPatch, VideoView};
