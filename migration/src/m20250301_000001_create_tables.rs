use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建教师（系统用户）表
        manager
            .create_table(
                Table::create()
                    .table(Instructors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Instructors::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Instructors::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Instructors::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Instructors::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Instructors::Role).string().not_null())
                    .col(ColumnDef::new(Instructors::Status).string().not_null())
                    .col(ColumnDef::new(Instructors::DisplayName).string().null())
                    .col(ColumnDef::new(Instructors::LastLogin).big_integer().null())
                    .col(ColumnDef::new(Instructors::ImagePath).string().null())
                    .col(ColumnDef::new(Instructors::SchedulePath).string().null())
                    .col(
                        ColumnDef::new(Instructors::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Instructors::UpdatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建课程表
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Courses::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Courses::OwnerId).big_integer().not_null())
                    .col(ColumnDef::new(Courses::Code).string_len(20).not_null())
                    .col(ColumnDef::new(Courses::Name).string_len(100).not_null())
                    .col(ColumnDef::new(Courses::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Courses::UpdatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Courses::Table, Courses::OwnerId)
                            .to(Instructors::Table, Instructors::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建学习小组表
        manager
            .create_table(
                Table::create()
                    .table(StudyGroups::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudyGroups::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StudyGroups::CourseId).big_integer().not_null())
                    .col(ColumnDef::new(StudyGroups::Name).string_len(50).not_null())
                    .col(
                        ColumnDef::new(StudyGroups::CreatedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(StudyGroups::Table, StudyGroups::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建学生表
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Students::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Students::UniversityId)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Students::Name).string_len(150).not_null())
                    .col(ColumnDef::new(Students::Gpa).double().null())
                    .col(ColumnDef::new(Students::ImagePath).string().null())
                    .col(ColumnDef::new(Students::FaceId).string().null())
                    .col(ColumnDef::new(Students::CreatedAt).big_integer().not_null())
                    .col(ColumnDef::new(Students::UpdatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        // 创建小组成员关联表
        manager
            .create_table(
                Table::create()
                    .table(GroupStudents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GroupStudents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GroupStudents::GroupId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupStudents::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(GroupStudents::JoinedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(GroupStudents::Table, GroupStudents::GroupId)
                            .to(StudyGroups::Table, StudyGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(GroupStudents::Table, GroupStudents::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建课堂表
        manager
            .create_table(
                Table::create()
                    .table(Lectures::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Lectures::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Lectures::CourseId).big_integer().not_null())
                    .col(ColumnDef::new(Lectures::GroupId).big_integer().not_null())
                    .col(ColumnDef::new(Lectures::DateTime).big_integer().not_null())
                    .col(ColumnDef::new(Lectures::Topic).string_len(200).not_null())
                    .col(ColumnDef::new(Lectures::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Lectures::Table, Lectures::CourseId)
                            .to(Courses::Table, Courses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Lectures::Table, Lectures::GroupId)
                            .to(StudyGroups::Table, StudyGroups::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建考勤记录表
        manager
            .create_table(
                Table::create()
                    .table(AttendanceRecords::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AttendanceRecords::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::LectureId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::StudentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::Status)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AttendanceRecords::RecordedAt)
                            .big_integer()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AttendanceRecords::Table, AttendanceRecords::LectureId)
                            .to(Lectures::Table, Lectures::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AttendanceRecords::Table, AttendanceRecords::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一约束
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uk_courses_code_owner")
                    .table(Courses::Table)
                    .col(Courses::Code)
                    .col(Courses::OwnerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uk_study_groups_name_course")
                    .table(StudyGroups::Table)
                    .col(StudyGroups::Name)
                    .col(StudyGroups::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uk_group_students_group_student")
                    .table(GroupStudents::Table)
                    .col(GroupStudents::GroupId)
                    .col(GroupStudents::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uk_attendance_records_lecture_student")
                    .table(AttendanceRecords::Table)
                    .col(AttendanceRecords::LectureId)
                    .col(AttendanceRecords::StudentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 查询索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_group_students_student_id")
                    .table(GroupStudents::Table)
                    .col(GroupStudents::StudentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_lectures_group_date")
                    .table(Lectures::Table)
                    .col(Lectures::GroupId)
                    .col(Lectures::DateTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_lectures_course_id")
                    .table(Lectures::Table)
                    .col(Lectures::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_attendance_records_student_status")
                    .table(AttendanceRecords::Table)
                    .col(AttendanceRecords::StudentId)
                    .col(AttendanceRecords::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 按照创建的相反顺序删除
        manager
            .drop_table(Table::drop().table(AttendanceRecords::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lectures::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GroupStudents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StudyGroups::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Instructors::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Instructors {
    #[sea_orm(iden = "instructors")]
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    Role,
    Status,
    DisplayName,
    LastLogin,
    ImagePath,
    SchedulePath,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Courses {
    #[sea_orm(iden = "courses")]
    Table,
    Id,
    OwnerId,
    Code,
    Name,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StudyGroups {
    #[sea_orm(iden = "study_groups")]
    Table,
    Id,
    CourseId,
    Name,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Students {
    #[sea_orm(iden = "students")]
    Table,
    Id,
    UniversityId,
    Name,
    Gpa,
    ImagePath,
    FaceId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum GroupStudents {
    #[sea_orm(iden = "group_students")]
    Table,
    Id,
    GroupId,
    StudentId,
    JoinedAt,
}

#[derive(DeriveIden)]
enum Lectures {
    #[sea_orm(iden = "lectures")]
    Table,
    Id,
    CourseId,
    GroupId,
    DateTime,
    Topic,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AttendanceRecords {
    #[sea_orm(iden = "attendance_records")]
    Table,
    Id,
    LectureId,
    StudentId,
    Status,
    RecordedAt,
}
